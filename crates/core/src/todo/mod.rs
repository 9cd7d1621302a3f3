//! TODO domain types and request validation.

mod error;
mod requests;
mod types;

pub use error::ValidationError;
pub use requests::{CreateTodoRequest, UpdateTodoRequest, TITLE_MAX_LENGTH};
pub use types::{NewTodo, Payload, Priority, Todo, TodoChanges, TodoFilter};
