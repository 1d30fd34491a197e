//! # Logtick Collector
//!
//! Metric sources sampled by the agent.
//!
//! ## Architecture
//!
//! - **`collectors`**: the [`Collector`] capability and its adapters
//!   - **`SystemCollector`**: host CPU and memory usage
//!   - **`MysqlCollector`**: `SHOW GLOBAL STATUS` counters
//!   - **`NginxCollector`**: the `stub_status` page
//!   - **`ProcessCollector`**: per-process usage for a list of process names
//! - **`metrics`**: the data each adapter produces
//!
//! [`build_collectors`] turns an [`AgentConfig`](logtick_config::AgentConfig)
//! into the set of adapters that could be constructed.

pub mod collectors;
pub mod metrics;

pub use collectors::*;
pub use metrics::*;
