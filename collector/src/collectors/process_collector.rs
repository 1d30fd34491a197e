use crate::{
    collectors::{
        Collector,
        Sample,
    },
    metrics::{
        match_target,
        ProcessData,
        ProcessInfo,
    },
};
use eyre::{
    bail,
    Result,
};
use logtick_config::ProcessConfig;
use std::{
    future::Future,
    mem,
    pin::Pin,
    sync::Arc,
    time::Duration,
};
use sysinfo::{
    Process,
    ProcessRefreshKind,
    ProcessesToUpdate,
    System,
    ThreadKind,
};

/// Samples usage of the processes whose names match the configured list.
pub struct ProcessCollector {
    system: System,
    process_names: Arc<[String]>,
    interval: Duration,
}

impl ProcessCollector {
    pub const NAME: &'static str = "process";

    pub fn new(config: &ProcessConfig) -> Result<Self> {
        let process_names: Vec<String> = config
            .process_names
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if process_names.is_empty() {
            bail!("process collector enabled but process_names is empty");
        }

        Ok(Self {
            system: System::new(),
            process_names: process_names.into(),
            interval: config.interval(),
        })
    }
}

fn read(system: &mut System, process_names: &[String]) -> ProcessData {
    system.refresh_memory();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu().with_memory().with_tasks(),
    );

    let total_memory = system.total_memory();
    let mut data = ProcessData::default();

    for (pid, process) in system.processes() {
        // Threads are listed as processes on Linux.
        if matches!(process.thread_kind(), Some(ThreadKind::Userland)) {
            continue;
        }
        let name = process.name().to_string_lossy();
        let Some(target) = match_target(&name, process_names) else {
            continue;
        };

        let memory_percent = if total_memory > 0 {
            process.memory() as f64 / total_memory as f64 * 100.0
        } else {
            0.0
        };

        data.add(
            target,
            ProcessInfo {
                pid: pid.as_u32(),
                name: name.into_owned(),
                cpu_percent: f64::from(process.cpu_usage()),
                memory_percent,
                memory_rss_bytes: process.memory(),
                num_threads: thread_count(process),
                status: process.status().to_string(),
            },
        );
    }

    data
}

/// The kernel's thread count. On Linux the task list leaves out the main thread.
fn thread_count(process: &Process) -> u32 {
    match process.tasks() {
        Some(tasks) if cfg!(target_os = "linux") => tasks.len() as u32 + 1,
        Some(tasks) => (tasks.len() as u32).max(1),
        None => 1,
    }
}

impl Collector for ProcessCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send + '_>> {
        Box::pin(async move {
            // A full process table refresh reads procfs for every process.
            let mut system = mem::take(&mut self.system);
            let process_names = self.process_names.clone();
            let (system, data) = tokio::task::spawn_blocking(move || {
                let data = read(&mut system, &process_names);
                (system, data)
            })
            .await?;
            self.system = system;
            Sample::new(&data)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(names: &[&str]) -> ProcessConfig {
        ProcessConfig {
            enabled: true,
            process_names: names.iter().map(|n| n.to_string()).collect(),
            collection_interval_seconds: 10,
        }
    }

    #[test]
    fn empty_name_list_fails_construction() {
        assert!(ProcessCollector::new(&config(&[])).is_err());
        assert!(ProcessCollector::new(&config(&["", " "])).is_err());
    }

    #[tokio::test]
    async fn no_match_is_an_empty_sample() {
        let mut collector = ProcessCollector::new(&config(&["no-such-process-7f3a9c"])).unwrap();
        let sample = collector.sample().await.unwrap();
        assert_eq!(sample["monitored_processes"], serde_json::json!({}));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn single_threaded_process_reports_kernel_thread_count() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();

        let mut collector = ProcessCollector::new(&config(&["sleep"])).unwrap();
        let sample = collector.sample().await.unwrap();

        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).unwrap();
        let kernel_threads: u64 = status
            .lines()
            .find_map(|line| line.strip_prefix("Threads:"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        child.kill().unwrap();
        child.wait().unwrap();

        let entry = sample["monitored_processes"]["sleep"]
            .as_array()
            .unwrap()
            .iter()
            .find(|info| info["pid"] == pid)
            .unwrap()
            .clone();
        assert_eq!(kernel_threads, 1);
        assert_eq!(entry["num_threads"], kernel_threads);
    }
}
