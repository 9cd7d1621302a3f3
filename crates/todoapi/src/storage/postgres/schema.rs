//! PostgreSQL SQL query constants.

pub const INSERT_TODO: &str = r#"
INSERT INTO todos (title, description, completed, priority, due_date, payload, created_at, updated_at)
VALUES ($1, $2, false, $3, $4, $5::json, $6, $6)
RETURNING id, title, description, completed, priority, due_date, payload, created_at, updated_at
"#;

pub const SELECT_TODO_BY_ID: &str = r#"
SELECT id, title, description, completed, priority, due_date, payload, created_at, updated_at
FROM todos
WHERE id = $1
"#;

/// NULL parameters disable their filter.
pub const SELECT_TODOS: &str = r#"
SELECT id, title, description, completed, priority, due_date, payload, created_at, updated_at
FROM todos
WHERE ($1::boolean IS NULL OR completed = $1)
  AND ($2::integer IS NULL OR priority = $2)
ORDER BY created_at DESC, id DESC
"#;

/// NULL parameters leave their column unchanged.
pub const UPDATE_TODO: &str = r#"
UPDATE todos
SET title = COALESCE($2, title),
    description = COALESCE($3, description),
    completed = COALESCE($4, completed),
    priority = COALESCE($5, priority),
    due_date = COALESCE($6, due_date),
    payload = COALESCE($7::json, payload),
    updated_at = $8
WHERE id = $1
RETURNING id, title, description, completed, priority, due_date, payload, created_at, updated_at
"#;

pub const DELETE_TODO: &str = "DELETE FROM todos WHERE id = $1";

pub const SELECT_ONE: &str = "SELECT 1::bigint";

pub const SELECT_APPLIED_REVISIONS: &str = "SELECT version FROM schema_migrations";

pub const INSERT_APPLIED_REVISION: &str =
    "INSERT INTO schema_migrations (version, description) VALUES ($1, $2)";
