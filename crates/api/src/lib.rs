//! DevPulse Web API
//!
//! Axum-based JSON API over the dashboard snapshot, plus static file serving.

pub mod aggregator;
mod handlers;
mod routes;

pub use aggregator::{AggregatorConfig, StatsAggregator};
pub use routes::create_router;

use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<StatsAggregator>,
}

impl AppState {
    pub fn new(aggregator: Arc<StatsAggregator>) -> Self {
        Self { aggregator }
    }
}

pub type SharedState = Arc<AppState>;
