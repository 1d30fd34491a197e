use crate::{
    collectors::{
        Collector,
        Sample,
    },
    metrics::SystemData,
};
use eyre::{
    bail,
    Result,
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use sysinfo::System;

/// Samples host wide CPU and memory usage.
pub struct SystemCollector {
    system: System,
    interval: Duration,
}

impl SystemCollector {
    pub const NAME: &'static str = "system";

    pub fn new(interval: Duration) -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes, prime the first one.
        system.refresh_cpu_usage();
        Self { system, interval }
    }

    fn read(&mut self) -> Result<SystemData> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        if self.system.cpus().is_empty() {
            bail!("no CPU information available");
        }

        Ok(SystemData {
            cpu_percent: f64::from(self.system.global_cpu_usage()),
            memory_used_mb: self.system.used_memory() / SystemData::BYTES_PER_MB,
            memory_free_mb: self.system.free_memory() / SystemData::BYTES_PER_MB,
        })
    }
}

impl Collector for SystemCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send + '_>> {
        Box::pin(async move {
            let data = self.read()?;
            Sample::new(&data)
        })
    }
}
