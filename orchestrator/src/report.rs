use logtick_collector::Sample;
use serde::{
    ser::SerializeMap,
    Serialize,
    Serializer,
};
use std::collections::BTreeMap;

/// Who is reporting. Fixed for the lifetime of the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
}

/// Latest sample of every source that has succeeded at least once.
///
/// Serializes flat, one `<name>_metrics` key per source:
///
/// ```json
/// {"agent_id": "...", "agent_name": "web-01", "timestamp": 1700000000, "system_metrics": {...}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedReport {
    pub agent_id: String,
    pub agent_name: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub sources: BTreeMap<String, Sample>,
}

impl ConsolidatedReport {
    pub fn source_key(name: &str) -> String {
        format!("{name}_metrics")
    }
}

impl Serialize for ConsolidatedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.sources.len()))?;
        map.serialize_entry("agent_id", &self.agent_id)?;
        map.serialize_entry("agent_name", &self.agent_name)?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (name, sample) in &self.sources {
            map.serialize_entry(&Self::source_key(name), sample)?;
        }
        map.end()
    }
}
