//! HTTP API
//!
//! ## Endpoints
//!
//! - `GET <metrics path>` - Prometheus text (default `/metrics`)
//! - `GET /status` - JSON status document, when enabled
//! - `GET /health` - Liveness probe, always `200 OK`
//! - `GET /` - `404` pointing at the metrics path

mod metrics;
mod server;
mod state;

pub use server::{bind, create_router, serve};
pub use state::AppState;
