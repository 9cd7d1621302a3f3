//! Storage backend implementations.
//!
//! Concrete implementations of [`TodoRepository`](todoapi_core::storage::TodoRepository).
//! The backend is chosen at runtime from the database settings; see
//! [`crate::db::Database::repository`].

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresRepository;
pub use sqlite::SqliteRepository;
