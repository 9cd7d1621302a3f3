use async_trait::async_trait;

use crate::timing::TimingInfo;
use crate::todo::{NewTodo, Todo, TodoChanges, TodoFilter};

use super::Result;

/// Repository for TODO operations.
///
/// Every method records its connection, query, transformation and total
/// timings into `timing`. `repository_total_ms` is written on failure too.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Inserts a new TODO and returns the stored row.
    async fn create_todo(&self, todo: NewTodo, timing: &mut TimingInfo) -> Result<Todo>;

    /// Gets a TODO by its ID.
    async fn get_todo(&self, id: i64, timing: &mut TimingInfo) -> Result<Option<Todo>>;

    /// Lists TODOs matching the filter, newest first.
    async fn list_todos(&self, filter: TodoFilter, timing: &mut TimingInfo) -> Result<Vec<Todo>>;

    /// Applies `changes` and returns the updated row, or `None` if it does not exist.
    async fn update_todo(
        &self,
        id: i64,
        changes: TodoChanges,
        timing: &mut TimingInfo,
    ) -> Result<Option<Todo>>;

    /// Deletes a TODO. Returns true if a row was removed.
    async fn delete_todo(&self, id: i64, timing: &mut TimingInfo) -> Result<bool>;

    /// Runs `SELECT 1`.
    async fn select_one(&self, timing: &mut TimingInfo) -> Result<i64>;
}
