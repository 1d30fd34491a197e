//! # Collectors Module
//!
//! - **`Collector` trait**: the interface every metric source implements
//! - **`SystemCollector`**, **`MysqlCollector`**, **`NginxCollector`**,
//!   **`ProcessCollector`**: the adapters
//! - **`build_collectors`**: constructs the enabled adapters from the agent
//!   configuration

pub mod collector;
pub mod mysql_collector;
pub mod nginx_collector;
pub mod process_collector;
pub mod system_collector;

// Re-export the main types for easy access
pub use collector::{
    Collector,
    Sample,
};
use logtick_config::AgentConfig;
pub use mysql_collector::MysqlCollector;
pub use nginx_collector::NginxCollector;
pub use process_collector::ProcessCollector;
pub use system_collector::SystemCollector;
use tracing::{
    error,
    info,
};

/// A collector that was enabled but could not be constructed.
#[derive(Debug)]
pub struct FailedCollector {
    pub name: &'static str,
    pub error: eyre::Report,
}

#[derive(Default)]
pub struct Collectors {
    pub active: Vec<Box<dyn Collector>>,
    pub failed: Vec<FailedCollector>,
}

impl Collectors {
    fn push(&mut self, name: &'static str, result: eyre::Result<Box<dyn Collector>>) {
        match result {
            Ok(collector) => {
                info!(collector = name, interval = ?collector.interval(), "Collector initialized");
                self.active.push(collector);
            }
            Err(error) => {
                error!(collector = name, error = %format!("{error:#}"), "Failed to initialize collector, skipping it");
                self.failed.push(FailedCollector { name, error });
            }
        }
    }

    /// Names of all enabled collectors, whether or not they could be built.
    pub fn enabled_names(&self) -> Vec<String> {
        self.active
            .iter()
            .map(|c| c.name().to_string())
            .chain(self.failed.iter().map(|f| f.name.to_string()))
            .collect()
    }
}

/// Builds every enabled collector. A construction failure is recorded and
/// never prevents the others from being built.
pub async fn build_collectors(config: &AgentConfig) -> Collectors {
    let mut collectors = Collectors::default();

    if config.system.enabled {
        collectors.push(SystemCollector::NAME, Ok(Box::new(SystemCollector::new(config.interval()))));
    }
    if config.mysql.enabled {
        let result = MysqlCollector::connect(&config.mysql)
            .await
            .map(|c| Box::new(c) as Box<dyn Collector>);
        collectors.push(MysqlCollector::NAME, result);
    }
    if config.nginx.enabled {
        let result = NginxCollector::new(&config.nginx).map(|c| Box::new(c) as Box<dyn Collector>);
        collectors.push(NginxCollector::NAME, result);
    }
    if config.process.enabled {
        let result = ProcessCollector::new(&config.process).map(|c| Box::new(c) as Box<dyn Collector>);
        collectors.push(ProcessCollector::NAME, result);
    }

    collectors
}
