//! Run engine trait and request/outcome types

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use super::summary::RunSummary;
use crate::collection::{CollectionDocument, EnvironmentDocument};
use crate::config::{RunVariables, Settings};
use crate::utils::DocumentError;

/// Errors reported by a run engine
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to prepare run workspace: {0}")]
    Workspace(#[source] io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Run engine exited with code {status:?}: {stderr}")]
    Exited { status: Option<i32>, stderr: String },

    #[error("Run report unusable: {0}")]
    Report(#[from] DocumentError),
}

/// Per-run options
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub iteration_count: u32,
    pub bail_on_failure: bool,
    pub variables: Arc<RunVariables>,
}

impl RunConfig {
    pub fn from_settings(settings: &Settings, variables: Arc<RunVariables>) -> Self {
        Self {
            iteration_count: settings.run_iterations,
            bail_on_failure: settings.enable_bail,
            variables,
        }
    }
}

/// Everything a run engine needs for one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub collection: CollectionDocument,
    pub environment: Option<EnvironmentDocument>,
    pub config: RunConfig,
}

/// Result of one run
///
/// A run can fail and still produce a summary, so both halves are optional.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub error: Option<RunError>,
    pub summary: Option<RunSummary>,
}

impl RunOutcome {
    pub fn completed(summary: RunSummary) -> Self {
        Self {
            error: None,
            summary: Some(summary),
        }
    }

    pub fn failed(error: RunError) -> Self {
        Self {
            error: Some(error),
            summary: None,
        }
    }
}

/// Executes collections
#[async_trait]
pub trait RunEngine: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run the collection to completion
    async fn run(&self, request: RunRequest) -> RunOutcome;
}
