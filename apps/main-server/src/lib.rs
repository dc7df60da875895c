//! Task API server.
//!
//! Exposes CRUD routes over tasks, backed by the DAO selected in the
//! configuration.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;

use std::{io, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{Router, http::HeaderValue};
use task_store::DaoRegistry;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::controller::TaskController;
use crate::state::{AppState, SharedState};

/// Creates the application router with all routes configured.
pub fn create_app(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    api::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the application state, resolving the configured task DAO.
pub async fn create_state(config: Config, registry: Arc<DaoRegistry>) -> anyhow::Result<SharedState> {
    let options = &config.controllers.task_controller.task_dao;
    let dao = registry.resolve(options).await.with_context(|| {
        format!(
            "fail to build task DAO {} on connector {}",
            options.dao_type, options.connector
        )
    })?;

    let tasks = TaskController::new(dao);
    Ok(Arc::new(AppState::new(config, tasks, registry)))
}

/// Waits up to `timeout` for the serve task to finish draining.
///
/// A task still running after `timeout` is aborted and awaited, so it no
/// longer holds any connector when this returns.
pub async fn drain_server(mut server: JoinHandle<io::Result<()>>, timeout: Duration) -> anyhow::Result<()> {
    match tokio::time::timeout(timeout, &mut server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server failed"),
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Server did not drain in time, forcing shutdown"
            );
            server.abort();
            match server.await {
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(e).context("server task panicked"),
                Ok(result) => result.context("server failed"),
            }
        }
    }
}

/// Initializes tracing with the given log level.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use entities::{Task, TaskPublicDto};
    use serde_json::{Value, json};
    use task_store::{ConnectorRegistry, DaoKind, DaoOptions};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    async fn test_state(config: Config) -> SharedState {
        let registry = Arc::new(DaoRegistry::new(Arc::new(ConnectorRegistry::new())));
        create_state(config, registry).await.unwrap()
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        };
        app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn test_app() -> Router {
        create_app(test_state(Config::default()).await)
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let app = test_app().await;

        let response = send(
            &app,
            Method::POST,
            "/task",
            Some(json!({ "description": "buy milk", "status": "open" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created: TaskPublicDto = json_body(response).await;
        assert_eq!(created.description, "buy milk");
        assert_eq!(created.created_at, created.last_updated);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let uri = format!("/task/{}", created.task_uuid);
        let response = send(&app, Method::PUT, &uri, Some(json!({ "status": "done" }))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let task: Task = json_body(response).await;
        assert_eq!(task.id, created.task_uuid);
        assert_eq!(task.status, "done");
        assert_eq!(task.description, "buy milk");
        assert!(task.last_updated > created.last_updated);

        let response = send(&app, Method::GET, "/tasks", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let tasks: Vec<TaskPublicDto> = json_body(response).await;
        assert_eq!(tasks.len(), 1);

        let response = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_several_fields() {
        let app = test_app().await;
        let created: TaskPublicDto = json_body(
            send(
                &app,
                Method::POST,
                "/task",
                Some(json!({ "description": "buy milk", "status": "open" })),
            )
            .await,
        )
        .await;
        let uri = format!("/task/{}", created.task_uuid);

        let response = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "description": "buy bread", "status": "done" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let task: Task = json_body(send(&app, Method::GET, &uri, None).await).await;
        assert_eq!(task.description, "buy bread");
        assert_eq!(task.status, "done");
        assert_eq!(task.created_at, created.created_at);
        assert!(task.last_updated >= created.last_updated);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let app = test_app().await;

        let response = send(&app, Method::GET, "/tasks", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let tasks: Vec<TaskPublicDto> = json_body(response).await;
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let app = test_app().await;

        for body in [
            json!({ "description": "buy milk" }),
            json!({ "description": "", "status": "open" }),
            json!({ "description": 42, "status": "open" }),
        ] {
            let response = send(&app, Method::POST, "/task", Some(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = json_body(response).await;
            assert_eq!(body["error"]["code"], "INVALID_REQUEST");
        }

        let tasks: Vec<TaskPublicDto> =
            json_body(send(&app, Method::GET, "/tasks", None).await).await;
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_field() {
        let app = test_app().await;
        let created: TaskPublicDto = json_body(
            send(
                &app,
                Method::POST,
                "/task",
                Some(json!({ "description": "buy milk", "status": "open" })),
            )
            .await,
        )
        .await;
        let uri = format!("/task/{}", created.task_uuid);

        let response = send(&app, Method::PUT, &uri, Some(json!({ "priority": "high" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::PUT, &uri, Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let task: Task = json_body(send(&app, Method::GET, &uri, None).await).await;
        assert_eq!(TaskPublicDto::from(task), created);
    }

    #[tokio::test]
    async fn test_missing_task() {
        let app = test_app().await;
        let uri = format!("/task/{}", Uuid::new_v4());

        let response = send(&app, Method::PUT, &uri, Some(json!({ "status": "done" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = json_body(response).await;
        assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");

        let response = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_task_uuid() {
        let app = test_app().await;

        let response = send(&app, Method::GET, "/task/not-a-uuid", None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = json_body(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let app = test_app().await;

        let response = send(&app, Method::GET, "/unknown", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = json_body(response).await;
        assert_eq!(body, json!("Not Found"));

        let response = send(&app, Method::DELETE, "/tasks", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = json_body(response).await;
        assert_eq!(body, json!("Not Allowed"));
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let mut config = Config::default();
        config.server.service = "todolist".to_string();
        config.server.copyright = "ACME".to_string();
        let app = create_app(test_state(config).await);

        let response = send(&app, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = json_body(response).await;
        assert_eq!(body, json!({ "service": "todolist", "copyright": "ACME" }));

        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_void_dao_fails_every_request() {
        let mut config = Config::default();
        config.controllers.task_controller.task_dao =
            DaoOptions::new(DaoKind::Void.as_str(), "default");
        let app = create_app(test_state(config).await);

        let response = send(&app, Method::GET, "/tasks", None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = json_body(response).await;
        assert_eq!(body["error"]["code"], "OPERATION_FAILED");
    }

    #[tokio::test]
    async fn test_unknown_dao_type_fails_startup() {
        let mut config = Config::default();
        config.controllers.task_controller.task_dao = DaoOptions::new("RedisDAO", "default");
        let registry = Arc::new(DaoRegistry::new(Arc::new(ConnectorRegistry::new())));

        let err = create_state(config, registry).await.unwrap_err();

        assert!(err.to_string().contains("fail to build task DAO RedisDAO"));
    }

    #[tokio::test]
    async fn test_drain_waits_for_finished_server() {
        let server = tokio::spawn(async { Ok(()) });

        drain_server(server, Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_reports_server_error() {
        let server = tokio::spawn(async { Err(io::Error::other("accept failed")) });

        let err = drain_server(server, Duration::from_secs(1)).await.unwrap_err();

        assert!(format!("{err:#}").contains("accept failed"));
    }

    #[tokio::test]
    async fn test_drain_aborts_stuck_server() {
        let pool = Arc::new(());
        let held = Arc::clone(&pool);
        let server = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<io::Result<()>>().await
        });

        drain_server(server, Duration::from_millis(10)).await.unwrap();

        // The aborted task has released everything it held.
        assert_eq!(Arc::strong_count(&pool), 1);
    }
}
