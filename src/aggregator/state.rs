//! Aggregate state
//!
//! Shared between the execute loop (writer) and the HTTP handlers (readers).

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::collection::CollectionDocument;
use crate::runner::{RunError, RunOutcome, RunSummary};
use crate::utils::write_json_atomic;

/// File the last redacted summary is written to
pub const SNAPSHOT_FILE: &str = "debug.tmp.json";

#[derive(Debug, Default)]
struct InnerState {
    lifetime_runs: u64,
    lifetime_iterations: u64,
    lifetime_requests: u64,
    last_summary: Option<Arc<RunSummary>>,
    collection_name: String,
    loaded_collection: Option<Arc<CollectionDocument>>,
}

/// Point-in-time copy of the aggregate state
#[derive(Debug, Clone, Default)]
pub struct AggregateSnapshot {
    pub lifetime_runs: u64,
    pub lifetime_iterations: u64,
    pub lifetime_requests: u64,
    pub last_summary: Option<Arc<RunSummary>>,
    pub collection_name: String,
    pub loaded_collection: Option<Arc<CollectionDocument>>,
}

/// Folds run outcomes into lifetime counters and the latest summary
#[derive(Debug, Clone)]
pub struct Aggregator {
    inner: Arc<RwLock<InnerState>>,
    snapshot_path: PathBuf,
}

impl Aggregator {
    /// Create an aggregator persisting snapshots into `work_dir`
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(InnerState::default())),
            snapshot_path: work_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        let state = self.inner.read();
        AggregateSnapshot {
            lifetime_runs: state.lifetime_runs,
            lifetime_iterations: state.lifetime_iterations,
            lifetime_requests: state.lifetime_requests,
            last_summary: state.last_summary.clone(),
            collection_name: state.collection_name.clone(),
            loaded_collection: state.loaded_collection.clone(),
        }
    }

    /// Record the collection the next run will execute
    pub fn set_loaded_collection(&self, collection: CollectionDocument) {
        self.inner.write().loaded_collection = Some(Arc::new(collection));
    }

    pub fn handle_outcome(&self, outcome: RunOutcome) {
        self.on_run_complete(outcome.error.as_ref(), outcome.summary);
    }

    /// Fold a finished run into the state
    pub fn on_run_complete(&self, error: Option<&RunError>, summary: Option<RunSummary>) {
        let Some(mut summary) = summary else {
            match error {
                Some(e) => error!(error = %e, "Failed to run collection, no summary was returned"),
                None => error!("Failed to run collection, no summary was returned"),
            }
            return;
        };

        log_executions(&summary);
        summary.redact();

        if let Err(e) = write_json_atomic(&self.snapshot_path, &summary) {
            warn!(
                path = %self.snapshot_path.display(),
                error = %e,
                "Failed to persist run snapshot"
            );
        }

        info!(duration_ms = summary.duration_ms(), "Run complete");

        if let Some(e) = error {
            error!(error = %e, "Run reported an error");
        }

        let iterations = summary.run.stats.iterations.total;
        let requests = summary.run.stats.requests.total;
        let name = summary.collection_name().to_string();

        let mut state = self.inner.write();
        state.lifetime_runs += 1;
        state.lifetime_iterations += iterations;
        state.lifetime_requests += requests;
        state.collection_name = name;
        state.last_summary = Some(Arc::new(summary));
    }
}

fn log_executions(summary: &RunSummary) {
    for execution in &summary.run.executions {
        let name = execution.item.name.as_str();
        match &execution.response {
            Some(response) => {
                info!(
                    request = %name,
                    response_time_ms = response.response_time,
                    request_id = execution.request_id().unwrap_or_default(),
                    "Completed request"
                );
                for (_, failure) in execution.failed_assertions() {
                    error!(
                        request = %name,
                        test = failure.test.as_deref().unwrap_or_default(),
                        reason = failure.message.as_deref().unwrap_or_default(),
                        "Assertion failed"
                    );
                }
            }
            None => {
                let reason = execution
                    .request_error
                    .as_ref()
                    .map(|e| match e.get("message").and_then(|m| m.as_str()) {
                        Some(message) => message.to_string(),
                        None => e.to_string(),
                    })
                    .unwrap_or_default();
                warn!(request = %name, error = %reason, "Failed request");
            }
        }
    }
}
