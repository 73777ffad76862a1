//! Metrics and status handlers
//!
//! Both views need at least one completed run. Until then they answer 500 with
//! a fixed message; the cause is only logged.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use super::state::AppState;
use crate::aggregator::{CONTENT_TYPE, ViewError, render_metrics, render_status};

const NO_DATA: &str = "No result data to show, maybe the collection has not run yet";

fn view_error(err: ViewError) -> Response {
    match &err {
        ViewError::NoRunData => debug!("View requested before the first completed run"),
        ViewError::Format(_) => error!(error = %err, "Failed to render view"),
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        NO_DATA,
    )
        .into_response()
}

/// Prometheus text for the latest run
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.aggregator.snapshot();
    match render_metrics(&snapshot, state.settings.request_metrics) {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => view_error(e),
    }
}

/// JSON status document
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.aggregator.snapshot();
    match render_status(&snapshot, &state.settings) {
        Ok(status) => Json(status).into_response(),
        Err(e) => view_error(e),
    }
}
