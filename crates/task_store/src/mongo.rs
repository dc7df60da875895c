//! MongoDB task DAO.

use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, SubsecRound, Utc};
use entities::{Task, TaskCreateDto, TaskUpdate};
use futures::TryStreamExt;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DaoKind, MongoConnector, TaskDao, TaskStoreError, TaskStoreResult};

/// Collection holding the task documents.
pub const TASKS_COLLECTION: &str = "tasks";

/// Stored shape of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TaskDocument {
    task_uuid: String,
    description: String,
    status: String,
    created_at: bson::DateTime,
    last_updated: bson::DateTime,
}

impl From<&Task> for TaskDocument {
    fn from(task: &Task) -> Self {
        Self {
            task_uuid: task.id.to_string(),
            description: task.description.clone(),
            status: task.status.clone(),
            created_at: bson::DateTime::from_chrono(task.created_at),
            last_updated: bson::DateTime::from_chrono(task.last_updated),
        }
    }
}

impl TryFrom<TaskDocument> for Task {
    type Error = TaskStoreError;

    fn try_from(document: TaskDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&document.task_uuid).map_err(|e| {
            TaskStoreError::Invalid(format!(
                "stored task_uuid {} is not a UUID: {}",
                document.task_uuid, e
            ))
        })?;
        Ok(Task {
            id,
            description: document.description,
            status: document.status,
            created_at: document.created_at.to_chrono(),
            last_updated: document.last_updated.to_chrono(),
        })
    }
}

fn filter_by_id(id: Uuid) -> Document {
    doc! { "task_uuid": id.to_string() }
}

/// Builds the update pipeline for `update`.
///
/// Values are wrapped in `$literal` so client strings are never read as
/// field paths. `last_updated` becomes the later of `now` and the stored
/// stamp plus one millisecond, so it always moves forward even within the
/// millisecond resolution of BSON datetimes. Pipeline updates need
/// MongoDB 4.2 or later.
pub(crate) fn build_update_pipeline(update: &TaskUpdate, now: DateTime<Utc>) -> Vec<Document> {
    let mut fields = Document::new();
    for (field, value) in update.changes() {
        fields.insert(field.as_str(), doc! { "$literal": value.as_str() });
    }
    fields.insert(
        "last_updated",
        doc! {
            "$max": [
                bson::DateTime::from_chrono(now),
                { "$add": ["$last_updated", 1] },
            ]
        },
    );
    vec![doc! { "$set": fields }]
}

/// Task DAO backed by a MongoDB collection.
///
/// Timestamps are kept with millisecond precision, the resolution of BSON
/// datetimes.
#[derive(Debug, Clone)]
pub struct MongoTaskDao {
    connector: MongoConnector,
    connector_name: String,
}

impl MongoTaskDao {
    pub fn new(connector: MongoConnector, connector_name: impl Into<String>) -> Self {
        Self {
            connector,
            connector_name: connector_name.into(),
        }
    }

    fn collection(&self) -> Collection<TaskDocument> {
        self.connector.collection(TASKS_COLLECTION)
    }
}

#[async_trait]
impl TaskDao for MongoTaskDao {
    fn kind(&self) -> DaoKind {
        DaoKind::Mongo
    }

    fn connector_name(&self) -> &str {
        &self.connector_name
    }

    #[tracing::instrument(skip(self, task), fields(connector = %self.connector_name))]
    async fn create(&self, task: TaskCreateDto) -> TaskStoreResult<Task> {
        let task = Task::new_at(task.description, task.status, Utc::now().trunc_subsecs(3));
        self.collection()
            .insert_one(TaskDocument::from(&task))
            .await?;
        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn read_by_id(&self, id: Uuid) -> TaskStoreResult<Task> {
        self.collection()
            .find_one(filter_by_id(id))
            .await?
            .ok_or_else(|| TaskStoreError::not_found("Task", id.to_string()))?
            .try_into()
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn read_all(&self) -> TaskStoreResult<Vec<Task>> {
        let documents: Vec<TaskDocument> = self
            .collection()
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;

        documents.into_iter().map(Task::try_from).collect()
    }

    #[tracing::instrument(skip(self, update), fields(connector = %self.connector_name, fields = ?update.field_names()))]
    async fn update(&self, id: Uuid, update: &TaskUpdate) -> TaskStoreResult<()> {
        update.validate()?;
        let result = self
            .collection()
            .update_one(filter_by_id(id), build_update_pipeline(update, Utc::now()))
            .await?;

        // Only a missing document is an error; modified_count is not checked.
        if result.matched_count == 0 {
            return Err(TaskStoreError::not_found("Task", id.to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(connector = %self.connector_name))]
    async fn delete(&self, id: Uuid) -> TaskStoreResult<()> {
        let result = self.collection().delete_one(filter_by_id(id)).await?;
        if result.deleted_count == 0 {
            return Err(TaskStoreError::not_found("Task", id.to_string()));
        }
        Ok(())
    }
}
