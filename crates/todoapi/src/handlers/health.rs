//! Health check endpoints.
//!
//! - `/livez` - Liveness check (immediate 200, no database access)
//! - `/api/healthcheck` - Database reachability

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use todoapi_core::timing::TimingInfo;

use crate::state::AppState;

/// GET /livez - Basic liveness check.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /api/healthcheck
///
/// Returns 200 when `SELECT 1` succeeds and 503 otherwise.
#[axum::debug_handler]
pub async fn healthcheck(State(state): State<AppState>) -> Response {
    let mut timing = TimingInfo::new();
    let backend = state.backend.name();

    match state.todo_repo.select_one(&mut timing).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "backend": backend,
                "database": "reachable",
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(backend, error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "backend": backend,
                    "database": "unreachable",
                    "detail": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
