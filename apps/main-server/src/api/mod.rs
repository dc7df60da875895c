//! API endpoints.

pub mod task;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::SharedState;

/// Body of the home route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeMessage {
    pub service: String,
    pub copyright: String,
}

/// Creates the API router with all endpoints.
pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(home).fallback(method_not_allowed))
        .route("/health", get(health_check).fallback(method_not_allowed))
        // Task endpoints
        .route("/tasks", get(task::list_tasks).fallback(method_not_allowed))
        .route("/task", post(task::create_task).fallback(method_not_allowed))
        .route(
            "/task/:task_uuid",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
}

async fn home(State(state): State<SharedState>) -> Json<HomeMessage> {
    Json(HomeMessage {
        service: state.config.server.service.clone(),
        copyright: state.config.server.copyright.clone(),
    })
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> (StatusCode, Json<&'static str>) {
    (StatusCode::NOT_FOUND, Json("Not Found"))
}

async fn method_not_allowed() -> (StatusCode, Json<&'static str>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json("Not Allowed"))
}
