//! Task entity and DTO definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PayloadError, TaskField, TaskUpdate};

/// A task persisted by the data-access layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned once at creation.
    #[serde(rename = "task_uuid")]
    pub id: Uuid,
    /// What to do.
    pub description: String,
    /// Free-form status text.
    pub status: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub last_updated: DateTime<Utc>,
}

impl Task {
    /// Creates a new task with a fresh identifier and timestamps.
    pub fn new(description: impl Into<String>, status: impl Into<String>) -> Self {
        Self::new_at(description, status, Utc::now())
    }

    /// Creates a new task whose timestamps are both set to `now`.
    pub fn new_at(
        description: impl Into<String>,
        status: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            status: status.into(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Applies every change of `update` and stamps `last_updated` with `now`.
    ///
    /// `now` is clamped so that `last_updated` never moves backwards.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) {
        for (field, value) in update.changes() {
            match field {
                TaskField::Description => self.description = value.clone(),
                TaskField::Status => self.status = value.clone(),
            }
        }
        self.last_updated = now.max(self.last_updated);
    }
}

/// Payload accepted when creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreateDto {
    pub description: String,
    pub status: String,
}

impl TaskCreateDto {
    /// Creates a new create payload.
    pub fn new(description: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: status.into(),
        }
    }

    /// Checks that both fields are present.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.description.is_empty() {
            return Err(PayloadError::EmptyValue(TaskField::Description.as_str()));
        }
        if self.status.is_empty() {
            return Err(PayloadError::EmptyValue(TaskField::Status.as_str()));
        }
        Ok(())
    }

    /// Builds a brand new task from this payload.
    pub fn into_task(self) -> Task {
        Task::new(self.description, self.status)
    }
}

/// The only task representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPublicDto {
    pub task_uuid: Uuid,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl TaskPublicDto {
    /// Converts the DTO back into the stored entity.
    pub fn into_task(self) -> Task {
        Task {
            id: self.task_uuid,
            description: self.description,
            status: self.status,
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }
}

impl From<&Task> for TaskPublicDto {
    fn from(task: &Task) -> Self {
        Self {
            task_uuid: task.id,
            description: task.description.clone(),
            status: task.status.clone(),
            created_at: task.created_at,
            last_updated: task.last_updated,
        }
    }
}

impl From<Task> for TaskPublicDto {
    fn from(task: Task) -> Self {
        Self {
            task_uuid: task.id,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            last_updated: task.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_new_task_timestamps_match() {
        let task = Task::new("buy milk", "open");
        assert_eq!(task.created_at, task.last_updated);
        assert!(!task.id.is_nil());
    }

    #[test]
    fn test_create_dto_generates_fresh_ids() {
        let dto = TaskCreateDto::new("buy milk", "open");
        let first = dto.clone().into_task();
        let second = dto.into_task();
        assert_ne!(first.id, second.id);
        assert_eq!(first.description, "buy milk");
        assert_eq!(first.status, "open");
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(TaskCreateDto::new("buy milk", "open").validate().is_ok());
        assert_eq!(
            TaskCreateDto::new("", "open").validate(),
            Err(PayloadError::EmptyValue("description"))
        );
        assert_eq!(
            TaskCreateDto::new("buy milk", "").validate(),
            Err(PayloadError::EmptyValue("status"))
        );
    }

    #[test]
    fn test_apply_update() {
        let mut task = Task::new("buy milk", "open");
        let later = task.created_at + Duration::seconds(5);

        task.apply(&TaskUpdate::new().status("done"), later);

        assert_eq!(task.status, "done");
        assert_eq!(task.description, "buy milk");
        assert_eq!(task.last_updated, later);
    }

    #[test]
    fn test_apply_never_moves_last_updated_backwards() {
        let mut task = Task::new("buy milk", "open");
        let earlier = task.created_at - Duration::seconds(5);

        task.apply(&TaskUpdate::new().description("buy bread"), earlier);

        assert_eq!(task.description, "buy bread");
        assert_eq!(task.last_updated, task.created_at);
    }

    #[test]
    fn test_public_dto_serialization() {
        let task = Task::new("buy milk", "open");
        let dto = TaskPublicDto::from(&task);
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["task_uuid"], task.id.to_string());
        assert_eq!(json["description"], "buy milk");
        assert_eq!(json["status"], "open");
        assert!(json.get("created_at").is_some());
        assert!(json.get("last_updated").is_some());

        assert_eq!(dto.into_task(), task);
    }

    #[test]
    fn test_task_serializes_with_public_field_names() {
        let task = Task::new("buy milk", "open");
        let task_json = serde_json::to_value(&task).unwrap();
        let dto_json = serde_json::to_value(TaskPublicDto::from(&task)).unwrap();
        assert_eq!(task_json, dto_json);
    }
}
