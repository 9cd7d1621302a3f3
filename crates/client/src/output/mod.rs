//! Output rendering: compact JSON for scripts, text for people.

pub mod json;
pub mod pretty;

pub use json::format_json;
