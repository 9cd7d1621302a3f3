//! HTTP status codes for repository failures.

use super::RepositoryError;

/// Status code the HTTP layer answers with when a repository call fails.
///
/// A missing row is a 404. Every other failure, including an unreachable
/// database, is a 500 carrying the error message.
///
/// ```
/// use todoapi_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// assert_eq!(repository_error_to_status_code(&RepositoryError::todo_not_found(7)), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::ConnectionFailed(_)
        | RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::InvalidData(_) => 500,
    }
}
