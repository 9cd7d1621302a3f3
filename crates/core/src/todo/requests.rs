//! API request types for TODO operations.
//!
//! These types are shared between the server and client for type-safe API communication.
//! Validation is pure: it turns a request into a `NewTodo` or `TodoChanges`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::types::{NewTodo, Payload, Priority, TodoChanges};

/// Maximum title length in characters, matching the `VARCHAR(255)` column.
pub const TITLE_MAX_LENGTH: usize = 255;

/// Request payload for creating a new TODO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl CreateTodoRequest {
    /// Create a new request with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            payload: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Validates the request and converts it into an insertable TODO.
    pub fn validate(self) -> Result<NewTodo, ValidationError> {
        Ok(NewTodo {
            title: validate_title(&self.title)?,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            payload: self.payload,
        })
    }
}

/// Request payload for updating a TODO.
///
/// Absent and `null` fields are both treated as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl UpdateTodoRequest {
    /// Validates the request and converts it into a set of changes.
    pub fn validate(self) -> Result<TodoChanges, ValidationError> {
        let title = self.title.as_deref().map(validate_title).transpose()?;

        Ok(TodoChanges {
            title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            due_date: self.due_date,
            payload: self.payload,
        })
    }
}

/// Checks the raw length, then trims. Blank titles are rejected.
fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let length = raw.chars().count();
    if length == 0 {
        return Err(ValidationError::new(
            "title",
            "String should have at least 1 character",
        ));
    }
    if length > TITLE_MAX_LENGTH {
        return Err(ValidationError::new(
            "title",
            format!("String should have at most {TITLE_MAX_LENGTH} characters"),
        ));
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("title", "Title cannot be empty"));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_defaults() {
        let request: CreateTodoRequest =
            serde_json::from_value(json!({ "title": "Buy milk" })).unwrap();
        let todo = request.validate().unwrap();

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.priority, Priority::Medium);
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, None);
        assert_eq!(todo.payload, None);
    }

    #[test]
    fn test_create_trims_title() {
        let todo = CreateTodoRequest::new("  Ship it  ").validate().unwrap();
        assert_eq!(todo.title, "Ship it");
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let err = CreateTodoRequest::new("   ").validate().unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "Title cannot be empty");
    }

    #[test]
    fn test_create_rejects_empty_title() {
        let err = CreateTodoRequest::new("").validate().unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_create_title_length_limit() {
        let max = "a".repeat(TITLE_MAX_LENGTH);
        assert!(CreateTodoRequest::new(max).validate().is_ok());

        let too_long = "a".repeat(TITLE_MAX_LENGTH + 1);
        let err = CreateTodoRequest::new(too_long).validate().unwrap_err();
        assert!(err.message.contains("at most 255"));
    }

    #[test]
    fn test_create_rejects_invalid_priority_on_deserialize() {
        let result: Result<CreateTodoRequest, _> =
            serde_json::from_value(json!({ "title": "x", "priority": 9 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_rejects_non_object_payload() {
        let result: Result<CreateTodoRequest, _> =
            serde_json::from_value(json!({ "title": "x", "payload": [1, 2, 3] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_accepts_nested_payload() {
        let request: CreateTodoRequest = serde_json::from_value(json!({
            "title": "x",
            "payload": { "tags": ["a", "b"], "meta": { "version": "1.0" } }
        }))
        .unwrap();
        let todo = request.validate().unwrap();
        let payload = todo.payload.unwrap();
        assert_eq!(payload["meta"]["version"], "1.0");
    }

    #[test]
    fn test_update_null_fields_are_unchanged() {
        let request: UpdateTodoRequest = serde_json::from_value(json!({
            "title": null,
            "completed": true
        }))
        .unwrap();
        let changes = request.validate().unwrap();

        assert_eq!(changes.title, None);
        assert_eq!(changes.completed, Some(true));
    }

    #[test]
    fn test_update_validates_title_when_present() {
        let request = UpdateTodoRequest {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateTodoRequest {
            title: Some(" Renamed ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap().title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_create_serializes_without_empty_optionals() {
        let json = serde_json::to_value(CreateTodoRequest::new("x")).unwrap();
        assert_eq!(json, json!({ "title": "x", "priority": 2 }));
    }
}
