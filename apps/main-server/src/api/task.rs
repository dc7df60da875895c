//! Task API endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use entities::{Task, TaskCreateDto, TaskPublicDto, TaskUpdate};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::state::SharedState;

fn parse_task_uuid(raw: &str) -> ServerResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| ServerError::InvalidRequest(format!("invalid task_uuid {raw}: {e}")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ServerError::InvalidRequest(e.body_text()))
}

fn log_failure(handler: &'static str) -> impl FnOnce(&ServerError) {
    move |e| tracing::error!(handler = handler, error = %e, "request failed")
}

/// Lists every task.
pub async fn list_tasks(State(state): State<SharedState>) -> ServerResult<Json<Vec<TaskPublicDto>>> {
    let tasks = state
        .tasks
        .get_all()
        .await
        .inspect_err(log_failure("list_tasks"))?;

    Ok(Json(tasks))
}

/// Creates a task.
pub async fn create_task(
    State(state): State<SharedState>,
    payload: Result<Json<TaskCreateDto>, JsonRejection>,
) -> ServerResult<Json<TaskPublicDto>> {
    let create = async {
        let task = body(payload)?;
        task.validate()
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        state.tasks.create(task).await
    };

    let created = create.await.inspect_err(log_failure("create_task"))?;
    Ok(Json(created))
}

/// Gets a task by identifier.
pub async fn get_task(
    State(state): State<SharedState>,
    Path(task_uuid): Path<String>,
) -> ServerResult<Json<Task>> {
    let get = async {
        let id = parse_task_uuid(&task_uuid)?;
        state.tasks.get(id).await
    };

    let task = get.await.inspect_err(log_failure("get_task"))?;
    Ok(Json(task))
}

/// Applies a partial update to a task.
pub async fn update_task(
    State(state): State<SharedState>,
    Path(task_uuid): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let update = async {
        let id = parse_task_uuid(&task_uuid)?;
        let changes = TaskUpdate::try_from(body(payload)?)
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        state.tasks.update(id, &changes).await
    };

    update.await.inspect_err(log_failure("update_task"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<SharedState>,
    Path(task_uuid): Path<String>,
) -> ServerResult<StatusCode> {
    let delete = async {
        let id = parse_task_uuid(&task_uuid)?;
        state.tasks.delete(id).await
    };

    delete.await.inspect_err(log_failure("delete_task"))?;
    Ok(StatusCode::NO_CONTENT)
}
