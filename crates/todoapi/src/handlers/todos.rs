//! TODO CRUD handlers.
//!
//! Each handler times itself with a [`RequestTimer`] and lends its
//! `TimingInfo` to the repository. Success and error responses both carry the
//! timing headers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;

use todoapi_core::serde::{deserialize_optional_bool, deserialize_optional_priority};
use todoapi_core::storage::RepositoryError;
use todoapi_core::todo::{CreateTodoRequest, Priority, TodoFilter, UpdateTodoRequest};

use super::{error::ApiError, timing::RequestTimer};
use crate::state::AppState;

/// Query parameters for listing TODOs. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListTodosQuery {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_priority")]
    pub priority: Option<Priority>,
}

impl From<ListTodosQuery> for TodoFilter {
    fn from(query: ListTodosQuery) -> Self {
        TodoFilter {
            completed: query.completed,
            priority: query.priority,
        }
    }
}

/// POST /api/todo
pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let Json(request) = body.map_err(|e| timer.fail(e))?;
    let new_todo = request.validate().map_err(|e| timer.fail(e))?;

    let todo = state
        .todo_repo
        .create_todo(new_todo, &mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?;

    tracing::info!(todo_id = todo.id, title = %todo.title, "Created TODO");
    timer.json(StatusCode::CREATED, &todo)
}

/// GET /api/todo
pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let Query(query) = query.map_err(|e| timer.fail(e))?;
    let filter = TodoFilter::from(query);

    let todos = state
        .todo_repo
        .list_todos(filter, &mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?;

    tracing::debug!(count = todos.len(), filter = ?filter, "Listed TODOs");
    timer.json(StatusCode::OK, &todos)
}

/// GET /api/todo/{id}
pub async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let Path(id) = path.map_err(|e| timer.fail(e))?;

    let todo = state
        .todo_repo
        .get_todo(id, &mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?
        .ok_or_else(|| timer.fail(RepositoryError::todo_not_found(id)))?;

    timer.json(StatusCode::OK, &todo)
}

/// PUT /api/todo/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let Path(id) = path.map_err(|e| timer.fail(e))?;
    let Json(request) = body.map_err(|e| timer.fail(e))?;
    let changes = request.validate().map_err(|e| timer.fail(e))?;
    if changes.is_empty() {
        tracing::debug!(todo_id = id, "Update has no field changes, only updated_at moves");
    }

    let todo = state
        .todo_repo
        .update_todo(id, changes, &mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?
        .ok_or_else(|| timer.fail(RepositoryError::todo_not_found(id)))?;

    tracing::info!(todo_id = todo.id, "Updated TODO");
    timer.json(StatusCode::OK, &todo)
}

/// DELETE /api/todo/{id}
pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let mut timer = RequestTimer::start();

    let Path(id) = path.map_err(|e| timer.fail(e))?;

    let deleted = state
        .todo_repo
        .delete_todo(id, &mut timer.info)
        .await
        .map_err(|e| timer.fail(e))?;

    if !deleted {
        return Err(timer.fail(RepositoryError::todo_not_found(id)));
    }

    tracing::info!(todo_id = id, "Deleted TODO");
    Ok(timer.empty(StatusCode::NO_CONTENT))
}
