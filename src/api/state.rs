//! Shared handler state

use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::config::Settings;

/// State handed to every HTTP handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, settings: Arc<Settings>) -> Self {
        Self {
            aggregator,
            settings,
        }
    }
}
