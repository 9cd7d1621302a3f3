//! Latency diagnostics.

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use super::{error::ApiError, timing::RequestTimer};
use crate::state::AppState;

/// GET /api/test/select-one
///
/// Runs `SELECT 1` so clients can separate connection overhead from query
/// cost. The body repeats the timing headers.
pub async fn select_one(State(state): State<AppState>) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let result = state
        .todo_repo
        .select_one(&mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?;

    let body = json!({
        "result": result,
        "timing": timer.snapshot().to_json_map(),
    });
    timer.json(StatusCode::OK, &body)
}
