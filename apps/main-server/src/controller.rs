//! Task controller.
//!
//! Thin layer between the HTTP handlers and the configured [`TaskDao`].

use std::sync::Arc;

use entities::{Task, TaskCreateDto, TaskPublicDto, TaskUpdate};
use task_store::TaskDao;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

/// Task use cases over one DAO.
#[derive(Debug, Clone)]
pub struct TaskController {
    dao: Arc<dyn TaskDao>,
}

impl TaskController {
    pub fn new(dao: Arc<dyn TaskDao>) -> Self {
        Self { dao }
    }

    pub async fn create(&self, task: TaskCreateDto) -> ServerResult<TaskPublicDto> {
        self.dao
            .create(task)
            .await
            .map(TaskPublicDto::from)
            .map_err(|e| ServerError::controller("create", e))
    }

    /// Returns the stored task itself rather than its public view.
    pub async fn get(&self, id: Uuid) -> ServerResult<Task> {
        self.dao
            .read_by_id(id)
            .await
            .map_err(|e| ServerError::controller("get", e))
    }

    pub async fn get_all(&self) -> ServerResult<Vec<TaskPublicDto>> {
        let tasks = self
            .dao
            .read_all()
            .await
            .map_err(|e| ServerError::controller("get all", e))?;

        Ok(tasks.into_iter().map(TaskPublicDto::from).collect())
    }

    pub async fn update(&self, id: Uuid, update: &TaskUpdate) -> ServerResult<()> {
        self.dao
            .update(id, update)
            .await
            .map_err(|e| ServerError::controller("update", e))
    }

    pub async fn delete(&self, id: Uuid) -> ServerResult<()> {
        self.dao
            .delete(id)
            .await
            .map_err(|e| ServerError::controller("delete", e))
    }
}

#[cfg(test)]
mod tests {
    use task_store::{MemoryTaskDao, VoidTaskDao};

    use super::*;

    fn controller() -> TaskController {
        TaskController::new(Arc::new(MemoryTaskDao::new("default")))
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let controller = controller();

        let created = controller
            .create(TaskCreateDto::new("buy milk", "open"))
            .await
            .unwrap();
        let task = controller.get(created.task_uuid).await.unwrap();

        assert_eq!(TaskPublicDto::from(&task), created);
        assert_eq!(created.created_at, created.last_updated);
    }

    #[tokio::test]
    async fn test_get_all_returns_public_views() {
        let controller = controller();
        assert!(controller.get_all().await.unwrap().is_empty());

        controller
            .create(TaskCreateDto::new("buy milk", "open"))
            .await
            .unwrap();
        controller
            .create(TaskCreateDto::new("walk dog", "open"))
            .await
            .unwrap();

        let tasks = controller.get_all().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|task| task.description == "walk dog"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let controller = controller();
        let created = controller
            .create(TaskCreateDto::new("buy milk", "open"))
            .await
            .unwrap();

        controller
            .update(created.task_uuid, &TaskUpdate::new().status("done"))
            .await
            .unwrap();
        assert_eq!(controller.get(created.task_uuid).await.unwrap().status, "done");

        controller.delete(created.task_uuid).await.unwrap();
        let err = controller.get(created.task_uuid).await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Controller { operation: "get", ref source } if source.is_not_found()
        ));
    }

    #[tokio::test]
    async fn test_errors_name_the_operation() {
        let controller = TaskController::new(Arc::new(VoidTaskDao::new("default")));

        let err = controller
            .create(TaskCreateDto::new("buy milk", "open"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "fail to create task: feature not implemented");
    }
}
