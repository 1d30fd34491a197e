use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// Server counters read from `SHOW GLOBAL STATUS`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MysqlData {
    pub uptime_seconds: u64,
    pub threads_connected: u64,
    pub threads_running: u64,
    pub total_connections: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub queries_total: u64,
    pub innodb_buffer_pool_reads_hits_ratio: f64,
}

impl MysqlData {
    /// Maps the `Variable_name -> Value` rows of `SHOW GLOBAL STATUS`.
    /// Missing or unparseable values read as 0.
    pub fn from_status(status: &HashMap<String, String>) -> Self {
        let counter = |name: &str| -> u64 {
            status
                .get(name)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or_default()
        };

        let read_requests = counter("Innodb_buffer_pool_read_requests");
        let reads = counter("Innodb_buffer_pool_reads");
        let innodb_buffer_pool_reads_hits_ratio = if read_requests > 0 {
            read_requests.saturating_sub(reads) as f64 / read_requests as f64 * 100.0
        } else {
            0.0
        };

        Self {
            uptime_seconds: counter("Uptime"),
            threads_connected: counter("Threads_connected"),
            threads_running: counter("Threads_running"),
            total_connections: counter("Connections"),
            bytes_received: counter("Bytes_received"),
            bytes_sent: counter("Bytes_sent"),
            queries_total: counter("Queries"),
            innodb_buffer_pool_reads_hits_ratio,
        }
    }
}
