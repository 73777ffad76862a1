//! Result aggregation
//!
//! [`Aggregator`] folds each finished run into lifetime counters and keeps the
//! latest redacted summary. The metrics text and the status document are pure
//! functions of an [`AggregateSnapshot`].

mod metrics;
mod state;
mod status;

pub use metrics::{CONTENT_TYPE, render_metrics};
pub use state::{AggregateSnapshot, Aggregator, SNAPSHOT_FILE};
pub use status::{MonitoredRequest, RuntimeCounters, StatusConfig, StatusDocument, render_status};

use std::fmt;
use thiserror::Error;

/// Errors from the metric and status views
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("No result data to show, maybe the collection has not run yet")]
    NoRunData,

    #[error("Failed to format metrics: {0}")]
    Format(#[from] fmt::Error),
}
