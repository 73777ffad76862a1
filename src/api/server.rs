//! HTTP server
//!
//! Axum router for the metrics, status and health endpoints.

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::metrics::{metrics_handler, status_handler};
use super::state::AppState;

/// Bind the listener on all interfaces
pub async fn bind(port: u16) -> io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await
}

/// Serve the router until the listener fails
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    let metrics_path = state.settings.metrics_path.clone();
    let status_enabled = state.settings.status_enabled;
    let addr = listener.local_addr()?;

    info!(
        addr = %addr,
        metrics = %metrics_path,
        status = status_enabled,
        "HTTP server listening"
    );

    axum::serve(listener, create_router(state)).await
}

/// Create the router
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(&state.settings.metrics_path, get(metrics_handler));

    if state.settings.status_enabled {
        router = router.route("/status", get(status_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("Nothing here, try {}", state.settings.metrics_path),
    )
}

/// Liveness probe
async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}
