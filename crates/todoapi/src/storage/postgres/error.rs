//! PostgreSQL error mapping.
//!
//! Maps `sqlx::Error` to `RepositoryError` from `todoapi_core::storage`.

use todoapi_core::storage::RepositoryError;

/// Maps a sqlx error to a RepositoryError.
///
/// # Error Mapping
///
/// - Pool and transport failures → `RepositoryError::ConnectionFailed`
/// - Decode failures → `RepositoryError::Serialization`
/// - Constraint violations → `RepositoryError::InvalidData`
/// - All other errors → `RepositoryError::QueryFailed`
pub fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => RepositoryError::ConnectionFailed(err.to_string()),

        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RepositoryError::Serialization(err.to_string())
        }

        sqlx::Error::Database(db_err)
            if db_err.is_check_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_unique_violation() =>
        {
            RepositoryError::InvalidData(db_err.message().to_string())
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_connection_failed() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_io_error_maps_to_connection_failed() {
        let err = sqlx::Error::Io(std::io::Error::other("connection reset"));
        assert!(matches!(
            map_sqlx_error(err),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_decode_maps_to_serialization() {
        let err = sqlx::Error::Decode("bad json".into());
        assert!(matches!(
            map_sqlx_error(err),
            RepositoryError::Serialization(_)
        ));
    }

    #[test]
    fn test_row_not_found_maps_to_query_failed() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepositoryError::QueryFailed(_)
        ));
    }
}
