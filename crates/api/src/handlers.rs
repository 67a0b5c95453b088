//! API request handlers

use crate::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Utc};
use devpulse_model::cards::stat_cards;
use serde::Serialize;
use tracing::{error, info};

/// GitHub launched in 2008; nothing to show before that
const FIRST_YEAR: i32 = 2008;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn err(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    fn with_status(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: false,
                data: None,
                error: Some(message.into()),
            }),
        )
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Whole dashboard snapshot
pub async fn get_dashboard(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.aggregator.snapshot();
    ApiResponse::ok(snapshot.as_ref().clone())
}

/// Profile counters; `data` is null until a profile fetch succeeds
pub async fn get_profile(State(state): State<SharedState>) -> impl IntoResponse {
    ApiResponse::ok(state.aggregator.snapshot().profile.clone())
}

pub async fn get_organizations(State(state): State<SharedState>) -> impl IntoResponse {
    ApiResponse::ok(state.aggregator.snapshot().organizations.clone())
}

pub async fn get_repositories(State(state): State<SharedState>) -> impl IntoResponse {
    ApiResponse::ok(state.aggregator.snapshot().repositories.clone())
}

pub async fn get_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    ApiResponse::ok(state.aggregator.snapshot().metrics.clone())
}

pub async fn get_contributions(State(state): State<SharedState>) -> impl IntoResponse {
    ApiResponse::ok(state.aggregator.snapshot().contributions.clone())
}

/// Switch the contribution year and return its calendar
pub async fn select_year(
    State(state): State<SharedState>,
    Path(year): Path<i32>,
) -> impl IntoResponse {
    let current = Utc::now().year();
    if !(FIRST_YEAR..=current).contains(&year) {
        return ApiResponse::<()>::bad_request(format!(
            "Year must be between {} and {}",
            FIRST_YEAR, current
        ))
        .into_response();
    }

    info!(year = year, "Selecting contribution year");
    state.aggregator.select_year(year).await;
    ApiResponse::ok(state.aggregator.snapshot().contributions.clone()).into_response()
}

/// Reload every slot
pub async fn refresh(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.aggregator.refresh().await;
    ApiResponse::ok(snapshot.as_ref().clone())
}

/// Third-party stat-card images for the account
pub async fn get_cards(State(state): State<SharedState>) -> impl IntoResponse {
    match stat_cards(state.aggregator.account()) {
        Ok(cards) => ApiResponse::ok(cards).into_response(),
        Err(e) => {
            error!("Failed to build stat cards: {}", e);
            ApiResponse::<()>::err(e.to_string()).into_response()
        }
    }
}
