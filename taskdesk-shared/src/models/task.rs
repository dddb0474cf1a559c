/// Task model
///
/// A task belongs to exactly one user (`user_id`) and moves freely between
/// `TODO`, `INPROGRESS` and `COMPLETED`. Rows are never physically removed;
/// deleting a task sets `deleted = TRUE` and hides it from every query.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status TEXT NOT NULL DEFAULT 'TODO'
///         CHECK (status IN ('TODO', 'INPROGRESS', 'COMPLETED')),
///     due_date TIMESTAMPTZ NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id),
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::task::{CreateTaskRequest, TaskStatus};
///
/// let body = r#"{"title": "Write report", "dueDate": "2025-04-05"}"#;
/// let request: CreateTaskRequest = serde_json::from_str(body).unwrap();
///
/// assert_eq!(request.status, None);
/// assert_eq!(request.due_date.to_rfc3339(), "2025-04-05T00:00:00+00:00");
/// assert_eq!(TaskStatus::default(), TaskStatus::Todo);
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::repository::{Entity, FieldValue};

/// Error returned for unknown status strings
#[derive(Debug, thiserror::Error)]
#[error("Invalid task status: {0}")]
pub struct InvalidStatus(pub String);

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "TODO")]
    Todo,

    #[serde(rename = "INPROGRESS")]
    InProgress,

    #[serde(rename = "COMPLETED")]
    Completed,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "INPROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "INPROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = InvalidStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    pub due_date: DateTime<Utc>,

    /// Owner, fixed at creation
    pub user_id: Uuid,

    #[serde(skip_serializing, default)]
    pub deleted: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Store-level input for inserting a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
}

/// Request body for `POST /tasks`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
}

impl CreateTaskRequest {
    /// Binds the request to its owner
    pub fn into_create(self, user_id: Uuid) -> CreateTask {
        CreateTask {
            user_id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            due_date: self.due_date,
        }
    }
}

/// Partial update for a task, also the body of `PUT /tasks/:id`
///
/// There is deliberately no `user_id` field: ownership never changes.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "deserialize_optional_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }

    /// Applies the update to an in-memory copy of the row
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

/// Query string of `GET /tasks`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    /// An empty value (`?status=`) means no status filter
    #[serde(default, deserialize_with = "deserialize_optional_status")]
    pub status: Option<TaskStatus>,

    pub search: Option<String>,

    pub sort_by: Option<String>,

    pub sort_direction: Option<String>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
}

/// Parses a due date given either as RFC 3339 or as a bare `YYYY-MM-DD`
///
/// Bare dates (and timestamps without an offset) are taken as UTC.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(format!(
        "invalid due date '{}', expected RFC 3339 or YYYY-MM-DD",
        raw
    ))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_due_date<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_due_date(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_optional_status<'de, D>(deserializer: D) -> Result<Option<TaskStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static str =
        "id, title, description, status, due_date, user_id, deleted, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.updated_at = at;
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.as_str().into(),
            "status" => self.status.as_str().into(),
            "due_date" => self.due_date.into(),
            "user_id" => self.user_id.into(),
            "deleted" => self.deleted.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "title" => Some("title"),
            "status" => Some("status"),
            "dueDate" => Some("due_date"),
            "createdAt" => Some("created_at"),
            "updatedAt" => Some("updated_at"),
            _ => None,
        }
    }
}
