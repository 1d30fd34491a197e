//! Streams the agent's log lines to a remote WebSocket endpoint.
//!
//! The [`LogSender`] keeps at most one connection alive and re-dials on a
//! fixed period. Lines emitted while there is no connection are dropped.
//! [`StreamLayer`] plugs the sender into a `tracing` subscriber.

#[macro_use]
extern crate tracing;

mod layer;
mod message;
mod sender;

pub use layer::StreamLayer;
pub use message::LogLine;
pub use sender::{
    ConnectionState,
    LogSender,
    LogSenderOptions,
};
