//! API route definitions

use crate::handlers;
use crate::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
};

/// Create the main application router
pub fn create_router(state: SharedState, static_dir: Option<PathBuf>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/profile", get(handlers::get_profile))
        .route("/organizations", get(handlers::get_organizations))
        .route("/repositories", get(handlers::get_repositories))
        .route("/metrics", get(handlers::get_metrics))
        .route("/contributions", get(handlers::get_contributions))
        .route("/contributions/{year}", post(handlers::select_year))
        .route("/refresh", post(handlers::refresh))
        .route("/cards", get(handlers::get_cards))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(CompressionLayer::new());

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app
}
