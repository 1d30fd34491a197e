use crate::report::AgentIdentity;
use prometheus::{
    Encoder as _,
    HistogramOpts,
    HistogramVec,
    IntCounterVec,
    IntGaugeVec,
    Opts,
    Registry,
    TextEncoder,
};
use std::time::Duration;

/// The agent's own metrics, exposed on the scrape endpoint.
pub struct Instrumentation {
    registry: Registry,
    identity: AgentIdentity,
    pub(crate) collected_total: IntCounterVec,
    pub(crate) sent_total: IntCounterVec,
    pub(crate) collection_duration: HistogramVec,
    pub(crate) collector_status: IntGaugeVec,
}

impl Instrumentation {
    pub fn new(identity: AgentIdentity) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let collected_total = IntCounterVec::new(
            Opts::new("agent_metrics_collected_total", "Total number of collection attempts per collector"),
            &["type", "agent_name", "agent_id"],
        )?;
        let sent_total = IntCounterVec::new(
            Opts::new("agent_metrics_sent_total", "Total number of report deliveries by outcome"),
            &["status", "agent_name", "agent_id"],
        )?;
        let collection_duration = HistogramVec::new(
            HistogramOpts::new("agent_collection_duration_seconds", "Duration of a single collection"),
            &["type"],
        )?;
        let collector_status = IntGaugeVec::new(
            Opts::new("agent_collector_status", "Whether the last collection succeeded (1) or failed (0)"),
            &["type", "agent_name", "agent_id"],
        )?;

        registry.register(Box::new(collected_total.clone()))?;
        registry.register(Box::new(sent_total.clone()))?;
        registry.register(Box::new(collection_duration.clone()))?;
        registry.register(Box::new(collector_status.clone()))?;

        Ok(Self {
            registry,
            identity,
            collected_total,
            sent_total,
            collection_duration,
            collector_status,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Exposes the status of an enabled collector as down until it first succeeds.
    pub fn register_collector(&self, name: &str) {
        self.set_collector_up(name, false);
    }

    pub fn record_collection(&self, name: &str, elapsed: Duration) {
        self.collected_total
            .with_label_values(&[name, self.identity.name.as_str(), self.identity.id.as_str()])
            .inc();
        self.collection_duration
            .with_label_values(&[name])
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_collector_up(&self, name: &str, up: bool) {
        self.collector_status
            .with_label_values(&[name, self.identity.name.as_str(), self.identity.id.as_str()])
            .set(i64::from(up));
    }

    pub fn record_delivery(&self, delivered: bool) {
        let status = if delivered { "success" } else { "failure" };
        self.sent_total
            .with_label_values(&[status, self.identity.name.as_str(), self.identity.id.as_str()])
            .inc();
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
