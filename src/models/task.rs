use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: i64,
    /// The title of the task.
    pub title: String,
    /// Whether the task is done. Pending tasks have `false`.
    pub is_completed: bool,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /tasks`.
///
/// Fields are optional at the serde level so that a missing title is reported as a
/// field-level validation message rather than a deserialization failure.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Required, 1 to 255 characters.
    #[validate(
        required(message = "The title field is required."),
        length(
            min = 1,
            max = 255,
            message = "The title field must be between 1 and 255 characters."
        )
    )]
    #[serde(default, deserialize_with = "super::input::trimmed")]
    pub title: Option<String>,

    /// Defaults to `false` when omitted. Accepts `1`/`0` as well as booleans.
    #[serde(default, deserialize_with = "super::input::boolean")]
    pub is_completed: Option<bool>,
}

/// Body of `PUT /tasks/{id}`. Only the completion flag can change.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(required(message = "The is completed field is required."))]
    #[serde(default, deserialize_with = "super::input::boolean")]
    pub is_completed: Option<bool>,
}

/// Validated insert payload handed to the task store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub is_completed: bool,
}

impl TaskInput {
    /// Converts an input that already passed `validate()` into a store payload.
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_default(),
            is_completed: self.is_completed.unwrap_or(false),
        }
    }
}
