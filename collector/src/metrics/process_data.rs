use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_rss_bytes: u64,
    pub num_threads: u32,
    pub status: String,
}

/// Processes matched per configured name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessData {
    pub monitored_processes: BTreeMap<String, Vec<ProcessInfo>>,
}

impl ProcessData {
    pub fn add(&mut self, target: &str, info: ProcessInfo) {
        self.monitored_processes.entry(target.to_string()).or_default().push(info);
    }
}

/// Returns the first target contained in `process_name`, ignoring case.
pub fn match_target<'a>(process_name: &str, targets: &'a [String]) -> Option<&'a str> {
    let process_name = process_name.to_lowercase();
    targets
        .iter()
        .find(|target| process_name.contains(&target.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_matching_target_wins() {
        let targets = vec!["mysql".to_string(), "mysqld".to_string(), "Nginx".to_string()];
        assert_eq!(match_target("mysqld", &targets), Some("mysql"));
        assert_eq!(match_target("nginx: worker process", &targets), Some("Nginx"));
        assert_eq!(match_target("NGINX", &targets), Some("Nginx"));
        assert_eq!(match_target("sshd", &targets), None);
    }

    #[test]
    fn groups_by_target() {
        let info = |pid| ProcessInfo {
            pid,
            name: "nginx".to_string(),
            cpu_percent: 0.0,
            memory_percent: 0.0,
            memory_rss_bytes: 0,
            num_threads: 1,
            status: "Sleeping".to_string(),
        };
        let mut data = ProcessData::default();
        data.add("nginx", info(1));
        data.add("nginx", info(2));

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["monitored_processes"]["nginx"].as_array().unwrap().len(), 2);
    }
}
