use crate::{
    instrumentation::Instrumentation,
    sink::ReportSink,
    state::ReportState,
    task::CollectionTask,
};
use futures::future::join_all;
use logtick_collector::Collector;
use std::{
    collections::HashSet,
    sync::Arc,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns and owns the collection tasks.
pub struct Orchestrator {
    state: Arc<ReportState>,
    sink: Arc<dyn ReportSink>,
    instrumentation: Arc<Instrumentation>,
}

impl Orchestrator {
    pub fn new(state: Arc<ReportState>, sink: Arc<dyn ReportSink>, instrumentation: Arc<Instrumentation>) -> Self {
        Self {
            state,
            sink,
            instrumentation,
        }
    }

    /// Spawns exactly one task per collector. The tasks stop when `parent`
    /// or the returned handle is cancelled.
    ///
    /// A collector whose name was already taken, or whose interval is zero,
    /// is logged and left out.
    pub fn start(self, collectors: Vec<Box<dyn Collector>>, parent: &CancellationToken) -> OrchestratorHandle {
        let token = parent.child_token();
        let mut names = Vec::with_capacity(collectors.len());
        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(collectors.len());

        for collector in collectors {
            let name = collector.name().to_string();
            if !seen.insert(name.clone()) {
                error!(collector = %name, "Duplicate collector name, ignoring this instance");
                continue;
            }
            if collector.interval().is_zero() {
                error!(collector = %name, "Collector interval is zero, ignoring it");
                continue;
            }

            let task = CollectionTask {
                collector,
                state: self.state.clone(),
                sink: self.sink.clone(),
                instrumentation: self.instrumentation.clone(),
                token: token.clone(),
            };
            handles.push(tokio::spawn(task.run()));
            names.push(name);
        }

        if names.is_empty() {
            warn!("No collectors are running, only local endpoints will be served");
        } else {
            info!(collectors = ?names, "Collection started");
        }

        OrchestratorHandle { token, handles, names }
    }
}

pub struct OrchestratorHandle {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    names: Vec<String>,
}

impl OrchestratorHandle {
    /// Signals every collection task to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns once every collection task has stopped.
    pub async fn wait(self) {
        for (name, result) in self.names.iter().zip(join_all(self.handles).await) {
            if let Err(e) = result {
                error!(collector = %name, error = %e, "Collection task ended abnormally");
            }
        }
        info!("All collection tasks stopped");
    }

    pub async fn shutdown(self) {
        self.cancel();
        self.wait().await;
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
