use serde::{
    Deserialize,
    Serialize,
};

/// One log line as sent over the wire, one text frame each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub agent_id: String,
    pub agent_name: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub service: String,
    pub message: String,
    pub level: String,
}
