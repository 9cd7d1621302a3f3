//! SQLite repository implementation.
//!
//! Implements [`TodoRepository`] from `todoapi_core::storage` using SQLite.

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::Connection;

use todoapi_core::storage::{Result, TodoRepository};
use todoapi_core::timing::{Stopwatch, TimingComponent, TimingInfo};
use todoapi_core::todo::{NewTodo, Todo, TodoChanges, TodoFilter};

use super::conversions::{format_datetime, payload_to_json, rows_to_todos, TodoRow};
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based TODO repository.
///
/// Holds a handle to the shared connection. All statements run on the
/// connection's background thread in submission order.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Runs `query` on the connection thread and records connection and query
    /// time.
    ///
    /// Connection acquisition is the wait until the closure starts running.
    async fn run<T, F>(&self, timing: &mut TimingInfo, query: F) -> Result<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let queued = Stopwatch::start();

        let (connection_ms, query_ms, value) = self
            .conn
            .call(move |conn| {
                let connection_ms = queued.elapsed_ms();
                let started = Stopwatch::start();
                let value = query(conn).map_err(wrap_err)?;
                Ok((connection_ms, started.elapsed_ms(), value))
            })
            .await
            .map_err(|e| {
                let error = map_tokio_rusqlite_error(e);
                tracing::error!(error = %error, "SQLite query failed");
                error
            })?;

        timing.set(TimingComponent::ConnectionAcquisition, connection_ms);
        timing.set(TimingComponent::QueryExecution, query_ms);
        Ok(value)
    }

    async fn insert(&self, todo: NewTodo, timing: &mut TimingInfo) -> Result<Todo> {
        let payload = todo.payload.as_ref().map(payload_to_json).transpose()?;
        let due_date = todo.due_date.as_ref().map(format_datetime);
        let now = format_datetime(&Utc::now());

        let row = self
            .run(timing, move |conn| {
                let mut stmt = conn.prepare_cached(schema::INSERT_TODO)?;
                stmt.query_row(
                    rusqlite::params![
                        todo.title,
                        todo.description,
                        todo.priority.as_i64(),
                        due_date,
                        payload,
                        now
                    ],
                    TodoRow::from_row,
                )
            })
            .await?;

        transform(timing, || row.into_todo())
    }

    async fn fetch(&self, id: i64, timing: &mut TimingInfo) -> Result<Option<Todo>> {
        let row = self
            .run(timing, move |conn| {
                let mut stmt = conn.prepare_cached(schema::SELECT_TODO_BY_ID)?;
                match stmt.query_row([id], TodoRow::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        transform(timing, || row.map(TodoRow::into_todo).transpose())
    }

    async fn fetch_all(&self, filter: TodoFilter, timing: &mut TimingInfo) -> Result<Vec<Todo>> {
        let completed = filter.completed;
        let priority = filter.priority.map(|p| p.as_i64());

        let rows = self
            .run(timing, move |conn| {
                let mut stmt = conn.prepare_cached(schema::SELECT_TODOS)?;
                let rows = stmt.query_map(rusqlite::params![completed, priority], TodoRow::from_row)?;

                let mut todos = Vec::new();
                for row_result in rows {
                    todos.push(row_result?);
                }
                Ok(todos)
            })
            .await?;

        transform(timing, || rows_to_todos(rows))
    }

    async fn apply_changes(
        &self,
        id: i64,
        changes: TodoChanges,
        timing: &mut TimingInfo,
    ) -> Result<Option<Todo>> {
        let payload = changes.payload.as_ref().map(payload_to_json).transpose()?;
        let due_date = changes.due_date.as_ref().map(format_datetime);
        let priority = changes.priority.map(|p| p.as_i64());
        let now = format_datetime(&Utc::now());

        let row = self
            .run(timing, move |conn| {
                let mut stmt = conn.prepare_cached(schema::UPDATE_TODO)?;
                let result = stmt.query_row(
                    rusqlite::params![
                        id,
                        changes.title,
                        changes.description,
                        changes.completed,
                        priority,
                        due_date,
                        payload,
                        now
                    ],
                    TodoRow::from_row,
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        transform(timing, || row.map(TodoRow::into_todo).transpose())
    }
}

/// Runs a row conversion and records it as data transformation time.
fn transform<T>(timing: &mut TimingInfo, convert: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Stopwatch::start();
    let result = convert();
    timing.record(TimingComponent::DataTransformation, started);
    result
}

// ============================================================================
// TodoRepository implementation
// ============================================================================

#[async_trait]
impl TodoRepository for SqliteRepository {
    async fn create_todo(&self, todo: NewTodo, timing: &mut TimingInfo) -> Result<Todo> {
        let total = Stopwatch::start();
        let result = self.insert(todo, timing).await;
        timing.record(TimingComponent::RepositoryTotal, total);

        if let Ok(todo) = &result {
            tracing::debug!(todo_id = todo.id, "Inserted TODO");
        }
        result
    }

    async fn get_todo(&self, id: i64, timing: &mut TimingInfo) -> Result<Option<Todo>> {
        let total = Stopwatch::start();
        let result = self.fetch(id, timing).await;
        timing.record(TimingComponent::RepositoryTotal, total);
        result
    }

    async fn list_todos(&self, filter: TodoFilter, timing: &mut TimingInfo) -> Result<Vec<Todo>> {
        let total = Stopwatch::start();
        let result = self.fetch_all(filter, timing).await;
        timing.record(TimingComponent::RepositoryTotal, total);
        result
    }

    async fn update_todo(
        &self,
        id: i64,
        changes: TodoChanges,
        timing: &mut TimingInfo,
    ) -> Result<Option<Todo>> {
        let total = Stopwatch::start();
        let result = self.apply_changes(id, changes, timing).await;
        timing.record(TimingComponent::RepositoryTotal, total);
        result
    }

    async fn delete_todo(&self, id: i64, timing: &mut TimingInfo) -> Result<bool> {
        let total = Stopwatch::start();
        let result = self
            .run(timing, move |conn| {
                let mut stmt = conn.prepare_cached(schema::DELETE_TODO)?;
                stmt.execute([id])
            })
            .await
            .map(|rows| rows > 0);
        timing.record(TimingComponent::RepositoryTotal, total);
        result
    }

    async fn select_one(&self, timing: &mut TimingInfo) -> Result<i64> {
        let total = Stopwatch::start();
        let result = self
            .run(timing, |conn| {
                conn.query_row(schema::SELECT_ONE, [], |row| row.get::<_, i64>(0))
            })
            .await;
        timing.record(TimingComponent::RepositoryTotal, total);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use todoapi_core::storage::RepositoryError;
    use todoapi_core::todo::{Payload, Priority};

    use crate::db::Database;

    async fn setup() -> SqliteRepository {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        crate::db::migrations::run_migrations(&db).await.unwrap();
        match db {
            Database::Sqlite(conn) => SqliteRepository::new(conn),
            Database::Postgres(_) => unreachable!(),
        }
    }

    fn payload(value: serde_json::Value) -> Payload {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let created = repo
            .create_todo(
                NewTodo::new("Write tests")
                    .with_description("for the repository")
                    .with_priority(Priority::High)
                    .with_payload(payload(json!({"tags": ["rust"]}))),
                &mut timing,
            )
            .await
            .unwrap();

        assert!(created.id > 0);
        assert!(!created.completed);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.created_at, created.updated_at);
        assert!(timing.repository_total_ms > 0.0);
        assert!(timing.query_execution_ms >= 0.0);

        let mut timing = TimingInfo::new();
        let fetched = repo.get_todo(created.id, &mut timing).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();
        assert_eq!(repo.get_todo(999, &mut timing).await.unwrap(), None);
        assert!(timing.repository_total_ms > 0.0);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let first = repo
            .create_todo(NewTodo::new("first").with_priority(Priority::Low), &mut timing)
            .await
            .unwrap();
        let second = repo
            .create_todo(NewTodo::new("second").with_priority(Priority::Critical), &mut timing)
            .await
            .unwrap();
        let third = repo
            .create_todo(NewTodo::new("third").with_priority(Priority::Low), &mut timing)
            .await
            .unwrap();
        repo.update_todo(
            second.id,
            TodoChanges {
                completed: Some(true),
                ..Default::default()
            },
            &mut timing,
        )
        .await
        .unwrap();

        let all = repo
            .list_todos(TodoFilter::default(), &mut timing)
            .await
            .unwrap();
        let ids: Vec<i64> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let done = repo
            .list_todos(
                TodoFilter {
                    completed: Some(true),
                    priority: None,
                },
                &mut timing,
            )
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, second.id);

        let low_open = repo
            .list_todos(
                TodoFilter {
                    completed: Some(false),
                    priority: Some(Priority::Low),
                },
                &mut timing,
            )
            .await
            .unwrap();
        assert_eq!(low_open.len(), 2);
        assert!(low_open.iter().all(|t| t.priority == Priority::Low));
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let created = repo
            .create_todo(
                NewTodo::new("original").with_description("keep me"),
                &mut timing,
            )
            .await
            .unwrap();

        let updated = repo
            .update_todo(
                created.id,
                TodoChanges {
                    title: Some("renamed".to_string()),
                    payload: Some(payload(json!({"v": 2}))),
                    ..Default::default()
                },
                &mut timing,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
        assert_eq!(updated.priority, created.priority);
        assert_eq!(updated.payload.unwrap()["v"], json!(2));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_due_date_round_trip_and_update() {
        use chrono::{FixedOffset, TimeZone};

        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let due = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 1, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        let created = repo
            .create_todo(NewTodo::new("File taxes").with_due_date(due), &mut timing)
            .await
            .unwrap();
        assert_eq!(created.due_date, Some(due));
        assert_eq!(
            created.due_date.unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
        );

        let fetched = repo.get_todo(created.id, &mut timing).await.unwrap().unwrap();
        assert_eq!(fetched.due_date, Some(due));

        // Unrelated changes keep the stored due date.
        let completed = repo
            .update_todo(
                created.id,
                TodoChanges {
                    completed: Some(true),
                    ..Default::default()
                },
                &mut timing,
            )
            .await
            .unwrap()
            .unwrap();
        assert!(completed.completed);
        assert_eq!(completed.due_date, Some(due));

        let moved = due + chrono::Duration::days(7);
        let rescheduled = repo
            .update_todo(
                created.id,
                TodoChanges {
                    due_date: Some(moved),
                    ..Default::default()
                },
                &mut timing,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rescheduled.due_date, Some(moved));
        assert!(rescheduled.completed);
    }

    #[tokio::test]
    async fn test_empty_update_bumps_updated_at() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let created = repo
            .create_todo(NewTodo::new("touch me"), &mut timing)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let updated = repo
            .update_todo(created.id, TodoChanges::default(), &mut timing)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, created.title);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();
        let result = repo
            .update_todo(42, TodoChanges::default(), &mut timing)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();

        let created = repo
            .create_todo(NewTodo::new("delete me"), &mut timing)
            .await
            .unwrap();

        assert!(repo.delete_todo(created.id, &mut timing).await.unwrap());
        assert!(!repo.delete_todo(created.id, &mut timing).await.unwrap());
        assert_eq!(repo.get_todo(created.id, &mut timing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_select_one() {
        let repo = setup().await;
        let mut timing = TimingInfo::new();
        assert_eq!(repo.select_one(&mut timing).await.unwrap(), 1);
        assert!(timing.repository_total_ms >= timing.query_execution_ms);
    }

    #[tokio::test]
    async fn test_query_error_still_records_total() {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        let repo = match db {
            Database::Sqlite(conn) => SqliteRepository::new(conn),
            Database::Postgres(_) => unreachable!(),
        };
        let mut timing = TimingInfo::new();

        let err = repo.get_todo(1, &mut timing).await.unwrap_err();
        assert!(matches!(err, RepositoryError::QueryFailed(_)));
        assert!(timing.repository_total_ms > 0.0);
    }
}
