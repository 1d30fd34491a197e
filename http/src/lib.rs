#[macro_use]
extern crate tracing;

pub mod error;
pub mod receiver;
pub mod router;

pub use receiver::create_receiver_router;
pub use router::{
    create_router,
    serve,
    AppState,
};
