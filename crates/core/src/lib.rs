//! todoapi_core - pure types and logic for the todoapi service.
//!
//! Nothing in this crate performs I/O. The server and client crates build
//! on these types.

pub mod database;
pub mod serde;
pub mod storage;
pub mod timing;
pub mod todo;
