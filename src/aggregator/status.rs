//! Status document

use serde::Serialize;

use super::ViewError;
use super::state::AggregateSnapshot;
use crate::collection::CollectionItem;
use crate::config::Settings;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub version: &'static str,
    pub config: StatusConfig,
    pub runtime_counters: RuntimeCounters,
    pub monitored_requests: Vec<MonitoredRequest>,
}

/// Configuration echoed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    pub run_interval: u64,
    pub refresh_interval: u64,
    pub enable_bail: bool,
    pub collection_source: String,
    pub env_source: String,
    pub request_metrics: bool,
    pub collection_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCounters {
    pub run_count: u64,
    pub iteration_count: u64,
    pub req_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoredRequest {
    pub name: String,
    pub url: Option<String>,
    pub method: Option<String>,
}

impl From<&CollectionItem> for MonitoredRequest {
    fn from(item: &CollectionItem) -> Self {
        Self {
            name: item.name().to_string(),
            url: item.url(),
            method: item.method(),
        }
    }
}

/// Build the status document for the snapshot
pub fn render_status(
    snapshot: &AggregateSnapshot,
    settings: &Settings,
) -> Result<StatusDocument, ViewError> {
    if snapshot.last_summary.is_none() {
        return Err(ViewError::NoRunData);
    }

    let monitored_requests = snapshot
        .loaded_collection
        .as_ref()
        .map(|c| c.item.iter().map(MonitoredRequest::from).collect())
        .unwrap_or_default();

    Ok(StatusDocument {
        version: env!("CARGO_PKG_VERSION"),
        config: StatusConfig {
            run_interval: settings.run_interval,
            refresh_interval: settings.refresh_interval,
            enable_bail: settings.enable_bail,
            collection_source: settings.collection_source(),
            env_source: settings.environment_source(),
            request_metrics: settings.request_metrics,
            collection_name: snapshot.collection_name.clone(),
        },
        runtime_counters: RuntimeCounters {
            run_count: snapshot.lifetime_runs,
            iteration_count: snapshot.lifetime_iterations,
            req_count: snapshot.lifetime_requests,
        },
        monitored_requests,
    })
}
