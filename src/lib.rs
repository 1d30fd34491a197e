#[macro_use]
extern crate tracing;

mod app;
mod logging;

pub use app::{
    run_receiver,
    App,
};
pub use logging::{
    init_errors,
    init_logging,
};
pub use logtick_config::{
    AgentConfig,
    Args,
};
