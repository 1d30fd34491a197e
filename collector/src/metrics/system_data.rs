use serde::{
    Deserialize,
    Serialize,
};

/// Host CPU and memory usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    pub cpu_percent: f64,
    pub memory_used_mb: u64,
    pub memory_free_mb: u64,
}

impl SystemData {
    pub const BYTES_PER_MB: u64 = 1024 * 1024;
}
