//! PostgreSQL storage backend implementation.
//!
//! Implements [`TodoRepository`](todoapi_core::storage::TodoRepository) on a
//! `sqlx` connection pool.

mod error;
mod repository;
pub(crate) mod schema;

pub use repository::PostgresRepository;
