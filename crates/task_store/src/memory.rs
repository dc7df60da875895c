//! In-memory task DAO.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use entities::{Task, TaskCreateDto, TaskUpdate};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{DaoKind, TaskDao, TaskStoreError, TaskStoreResult};

/// Task DAO keeping tasks in a map owned by the instance.
///
/// Tasks are not persisted and not shared between instances.
#[derive(Debug, Default)]
pub struct MemoryTaskDao {
    connector_name: String,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskDao {
    /// Creates a new, empty in-memory DAO.
    pub fn new(connector_name: impl Into<String>) -> Self {
        Self {
            connector_name: connector_name.into(),
            tasks: RwLock::default(),
        }
    }

    fn missing(id: Uuid) -> TaskStoreError {
        TaskStoreError::not_found("Task", format!("no task with this UUID ({id}) exist"))
    }
}

#[async_trait]
impl TaskDao for MemoryTaskDao {
    fn kind(&self) -> DaoKind {
        DaoKind::InMemory
    }

    fn connector_name(&self) -> &str {
        &self.connector_name
    }

    async fn create(&self, task: TaskCreateDto) -> TaskStoreResult<Task> {
        let task = task.into_task();
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn read_by_id(&self, id: Uuid) -> TaskStoreResult<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(&id).cloned().ok_or_else(|| Self::missing(id))
    }

    async fn read_all(&self) -> TaskStoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut result: Vec<Task> = tasks.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn update(&self, id: Uuid, update: &TaskUpdate) -> TaskStoreResult<()> {
        update.validate()?;
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        task.apply(update, Utc::now());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.remove(&id).is_none() {
            return Err(Self::missing(id));
        }
        Ok(())
    }
}
