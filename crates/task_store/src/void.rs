//! Placeholder task DAO used when no backend is configured.

use async_trait::async_trait;
use entities::{Task, TaskCreateDto, TaskUpdate};
use uuid::Uuid;

use crate::{DaoKind, TaskDao, TaskStoreError, TaskStoreResult};

/// Task DAO whose operations all fail with `FeatureNotImplemented`.
#[derive(Debug, Clone, Default)]
pub struct VoidTaskDao {
    connector_name: String,
}

impl VoidTaskDao {
    pub fn new(connector_name: impl Into<String>) -> Self {
        Self {
            connector_name: connector_name.into(),
        }
    }
}

#[async_trait]
impl TaskDao for VoidTaskDao {
    fn kind(&self) -> DaoKind {
        DaoKind::Void
    }

    fn connector_name(&self) -> &str {
        &self.connector_name
    }

    async fn create(&self, _task: TaskCreateDto) -> TaskStoreResult<Task> {
        Err(TaskStoreError::FeatureNotImplemented)
    }

    async fn read_by_id(&self, _id: Uuid) -> TaskStoreResult<Task> {
        Err(TaskStoreError::FeatureNotImplemented)
    }

    async fn read_all(&self) -> TaskStoreResult<Vec<Task>> {
        Err(TaskStoreError::FeatureNotImplemented)
    }

    async fn update(&self, _id: Uuid, _update: &TaskUpdate) -> TaskStoreResult<()> {
        Err(TaskStoreError::FeatureNotImplemented)
    }

    async fn delete(&self, _id: Uuid) -> TaskStoreResult<()> {
        Err(TaskStoreError::FeatureNotImplemented)
    }
}
