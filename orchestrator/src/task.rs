use crate::{
    instrumentation::Instrumentation,
    sink::ReportSink,
    state::ReportState,
};
use logtick_collector::Collector;
use std::sync::Arc;
use tokio::time::{
    Instant,
    MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

/// Drives one collector: sample, update the shared state, deliver.
pub(crate) struct CollectionTask {
    pub(crate) collector: Box<dyn Collector>,
    pub(crate) state: Arc<ReportState>,
    pub(crate) sink: Arc<dyn ReportSink>,
    pub(crate) instrumentation: Arc<Instrumentation>,
    pub(crate) token: CancellationToken,
}

impl CollectionTask {
    pub(crate) async fn run(mut self) {
        let name = self.collector.name().to_string();
        let mut ticker = tokio::time::interval(self.collector.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(collector = %name, interval = ?self.collector.interval(), "Collection task started");

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.collector.sample() => result,
            };
            if self.token.is_cancelled() {
                break;
            }
            self.instrumentation.record_collection(&name, started.elapsed());

            let sample = match result {
                Ok(sample) => sample,
                Err(e) => {
                    self.instrumentation.set_collector_up(&name, false);
                    warn!(collector = %name, error = %format!("{e:#}"), "Collection failed");
                    continue;
                }
            };
            self.instrumentation.set_collector_up(&name, true);
            debug!(collector = %name, elapsed = ?started.elapsed(), "Collected sample");

            self.state.update(&name, sample);
            let report = self.state.publish(self.state.snapshot());

            let delivered = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                delivered = self.sink.deliver(&report) => delivered,
            };
            match delivered {
                Ok(()) => {
                    self.instrumentation.record_delivery(true);
                    debug!(collector = %name, sources = report.sources.len(), "Report delivered");
                }
                Err(e) => {
                    self.instrumentation.record_delivery(false);
                    warn!(collector = %name, error = %e, "Failed to deliver report");
                }
            }
        }

        debug!(collector = %name, "Collection task stopped");
    }
}
