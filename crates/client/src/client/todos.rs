//! TODO API operations.

use serde::{Deserialize, Serialize};

use todoapi_core::timing::TimingInfo;
use todoapi_core::todo::{CreateTodoRequest, Todo, TodoFilter, UpdateTodoRequest};

use super::{Timed, TodoClient};
use crate::error::Result;

/// Body of `GET /api/test/select-one`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOneResponse {
    pub result: i64,
    pub timing: TimingInfo,
}

/// Query string pairs for a list filter. Unset filters are left out.
fn filter_query(filter: &TodoFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(completed) = filter.completed {
        query.push(("completed", completed.to_string()));
    }
    if let Some(priority) = filter.priority {
        query.push(("priority", priority.as_i64().to_string()));
    }
    query
}

impl TodoClient {
    /// Create a new TODO.
    pub async fn create_todo(&self, req: &CreateTodoRequest) -> Result<Todo> {
        Ok(self.create_todo_timed(req).await?.value)
    }

    pub async fn create_todo_timed(&self, req: &CreateTodoRequest) -> Result<Timed<Todo>> {
        let request = self.client.post(self.url("/api/todo")).json(req);
        self.send_timed(request).await
    }

    /// Get TODO by ID.
    pub async fn get_todo(&self, id: i64) -> Result<Todo> {
        Ok(self.get_todo_timed(id).await?.value)
    }

    pub async fn get_todo_timed(&self, id: i64) -> Result<Timed<Todo>> {
        let request = self.client.get(self.url(&format!("/api/todo/{id}")));
        self.send_timed(request).await
    }

    /// List TODOs, newest first.
    pub async fn list_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>> {
        Ok(self.list_todos_timed(filter).await?.value)
    }

    pub async fn list_todos_timed(&self, filter: &TodoFilter) -> Result<Timed<Vec<Todo>>> {
        let request = self
            .client
            .get(self.url("/api/todo"))
            .query(&filter_query(filter));
        self.send_timed(request).await
    }

    /// Update a TODO. Unset fields are left unchanged.
    pub async fn update_todo(&self, id: i64, req: &UpdateTodoRequest) -> Result<Todo> {
        Ok(self.update_todo_timed(id, req).await?.value)
    }

    pub async fn update_todo_timed(
        &self,
        id: i64,
        req: &UpdateTodoRequest,
    ) -> Result<Timed<Todo>> {
        let request = self
            .client
            .put(self.url(&format!("/api/todo/{id}")))
            .json(req);
        self.send_timed(request).await
    }

    /// Delete TODO by ID.
    pub async fn delete_todo(&self, id: i64) -> Result<()> {
        self.delete_todo_timed(id).await.map(|_| ())
    }

    pub async fn delete_todo_timed(&self, id: i64) -> Result<Timed<()>> {
        let request = self.client.delete(self.url(&format!("/api/todo/{id}")));
        self.send_timed_empty(request).await
    }

    /// Run `SELECT 1` on the server.
    pub async fn select_one(&self) -> Result<SelectOneResponse> {
        Ok(self.select_one_timed().await?.value)
    }

    pub async fn select_one_timed(&self) -> Result<Timed<SelectOneResponse>> {
        let request = self.client.get(self.url("/api/test/select-one"));
        self.send_timed(request).await
    }
}
