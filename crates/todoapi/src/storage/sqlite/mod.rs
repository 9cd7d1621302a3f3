//! SQLite storage backend implementation.
//!
//! Implements [`TodoRepository`](todoapi_core::storage::TodoRepository) with
//! `rusqlite` for synchronous operations and `tokio-rusqlite` for async
//! wrapping. A single connection serves all requests.

mod conversions;
mod error;
mod repository;
pub(crate) mod schema;

pub use repository::SqliteRepository;
