//! REST API handlers for the status server

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::redeem::{BookStats, RedeemRequest, RedeemResponse};
use crate::storage::TAIL_LINES;
use crate::worker::StatsSnapshot;

/// Header carrying the caller's owner id on `/api/start`
pub const OWNER_HEADER: &str = "x-owner-id";

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub worker: StatsSnapshot,
    pub uptime_secs: u64,
    pub book: BookStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health_check))
        .route("/api/status", get(status))
        .route("/api/logs", get(logs))
        .route("/api/start", get(start))
        .route("/api/redeem", post(redeem))
        .with_state(state)
}

async fn home() -> impl IntoResponse {
    Json(HomeResponse {
        message: "Coupon audit service is live".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(StatusResponse {
        worker: state.stats.snapshot().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
        book: state.book.stats().await,
    }))
}

async fn logs(State(state): State<AppState>) -> axum::response::Response {
    match state.journal.tail(TAIL_LINES).await {
        Ok(lines) => Json(LogsResponse { lines }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read attempt journal");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to read logs")),
            )
                .into_response()
        }
    }
}

async fn start(State(state): State<AppState>, headers: HeaderMap) -> axum::response::Response {
    let caller = headers.get(OWNER_HEADER).and_then(|v| v.to_str().ok());
    let authorized = match (&state.owner_id, caller) {
        (Some(owner), Some(caller)) => owner == caller,
        _ => false,
    };

    if !authorized {
        tracing::warn!("Unauthorized access to /api/start");
        return (StatusCode::FORBIDDEN, Json(ErrorResponse::new("Unauthorized"))).into_response();
    }

    tracing::info!("Sending welcome message");
    state
        .notifier
        .notify("Welcome to the coupon audit bot.\nOnly the owner can use this bot.")
        .await;

    Json(StartResponse {
        message: "Welcome message sent.".to_string(),
    })
    .into_response()
}

async fn redeem(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RedeemRequest>,
) -> axum::response::Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if !state.book.authorize(token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(RedeemResponse {
                code: 401,
                message: "Unauthorized".to_string(),
                coupon_code: None,
            }),
        )
            .into_response();
    }

    Json(state.book.redeem(request.coupon.trim()).await).into_response()
}
