//! todoapi_client - CLI client and latency benchmark for the todoapi service.

pub mod bench;
pub mod cli;
pub mod client;
pub mod error;
pub mod output;

pub use client::{Timed, TodoClient};
pub use error::{ClientError, Result};
