use crate::report::{
    AgentIdentity,
    ConsolidatedReport,
};
use logtick_collector::Sample;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        Mutex,
        PoisonError,
        RwLock,
    },
};

/// Last successful sample per source, plus the last published report.
///
/// The sample map and the published report are guarded independently, so
/// readers of the published report never wait on a collection in progress.
/// A failed sample must simply not call [`ReportState::update`]: the entry
/// from the previous success stays in place.
#[derive(Debug)]
pub struct ReportState {
    identity: AgentIdentity,
    samples: Mutex<BTreeMap<String, Sample>>,
    latest: RwLock<Option<Arc<ConsolidatedReport>>>,
}

impl ReportState {
    pub fn new(identity: AgentIdentity) -> Self {
        Self {
            identity,
            samples: Mutex::new(BTreeMap::new()),
            latest: RwLock::new(None),
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn update(&self, name: &str, sample: Sample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), sample);
    }

    pub fn get(&self, name: &str) -> Option<Sample> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    /// Copies the current map into a report stamped with the current time.
    pub fn snapshot(&self) -> ConsolidatedReport {
        let sources = self.samples.lock().unwrap_or_else(PoisonError::into_inner).clone();
        ConsolidatedReport {
            agent_id: self.identity.id.clone(),
            agent_name: self.identity.name.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            sources,
        }
    }

    /// Replaces the published report. Last write wins.
    pub fn publish(&self, report: ConsolidatedReport) -> Arc<ConsolidatedReport> {
        let report = Arc::new(report);
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        report
    }

    pub fn latest(&self) -> Option<Arc<ConsolidatedReport>> {
        self.latest.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
