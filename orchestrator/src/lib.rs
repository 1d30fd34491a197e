//! The collection runtime: one task per collector, a shared report state,
//! delivery of every fresh report and the agent's own instrumentation.

#[macro_use]
extern crate tracing;

pub mod instrumentation;
pub mod orchestrator;
pub mod report;
pub mod sink;
pub mod state;
mod task;

pub use instrumentation::Instrumentation;
pub use orchestrator::{
    Orchestrator,
    OrchestratorHandle,
};
pub use report::{
    AgentIdentity,
    ConsolidatedReport,
};
pub use sink::{
    DeliveryError,
    HttpSink,
    ReportSink,
};
pub use state::ReportState;
