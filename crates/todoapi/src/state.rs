//! Application state shared by all request handlers.

use std::sync::Arc;

use todoapi_core::database::BackendKind;
use todoapi_core::storage::TodoRepository;

use crate::db::Database;

/// Shared application state.
///
/// Cloned for each request. The repository shares the process-wide database
/// handle.
#[derive(Clone)]
pub struct AppState {
    pub todo_repo: Arc<dyn TodoRepository>,
    /// Backend in use, reported by the health check.
    pub backend: BackendKind,
}

impl AppState {
    pub fn new(todo_repo: Arc<dyn TodoRepository>, backend: BackendKind) -> Self {
        Self { todo_repo, backend }
    }

    /// State over a connected database.
    pub fn from_database(db: &Database) -> Self {
        Self::new(db.repository(), db.kind())
    }
}

// ============================================================================
// Test support
// ============================================================================
