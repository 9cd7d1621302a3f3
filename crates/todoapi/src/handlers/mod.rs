pub mod diagnostics;
pub mod error;
pub mod health;
pub mod timing;
pub mod todos;

pub use error::ApiError;
