#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use flowreg_api::config::ServerConfig;
use flowreg_api::router::build_app_router;
use flowreg_api::state::AppState;
use flowreg_core::executor::{ApiExecutor, DeferredExecutor};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
    }
}

/// Build the full application router with the default executor.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_executor(pool, Arc::new(DeferredExecutor))
}

/// Build the full application router with a custom executor.
pub fn build_test_app_with_executor(pool: PgPool, executor: Arc<dyn ApiExecutor>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        executor,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Minimal valid template body.
pub fn template_body(name: &str) -> Value {
    json!({"name": name, "state_schema": {"type": "object"}, "end_action_type": "none"})
}

/// Template body declaring workflow dependencies on the given template names.
pub fn template_with_dependencies(name: &str, deps: &[&str]) -> Value {
    let entries: Vec<Value> = deps
        .iter()
        .map(|dep| {
            json!({
                "name": dep,
                "api": {"endpoint": format!("https://deps.example.com/{dep}"), "method": "GET"},
                "on_failure": {"action_type": "workflow", "action_target": {"workflow_id": "fallback"}}
            })
        })
        .collect();
    json!({
        "name": name,
        "state_schema": {"type": "object"},
        "workflow_dependencies": entries,
        "end_action_type": "none"
    })
}

/// Create a template and return its `data` object.
pub async fn create_template(pool: &PgPool, body: Value) -> Value {
    let response = post_json(build_test_app(pool.clone()), "/api/workflow-templates", body).await;
    assert_eq!(response.status(), 201, "template creation failed");
    body_json(response).await["data"].clone()
}

/// Create a workflow for `user_id` in a fresh conversation and return its `data` object.
pub async fn create_workflow(pool: &PgPool, template_id: &str, user_id: &str) -> Value {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/workflows",
        json!({
            "template_id": template_id,
            "conversation_id": flowreg_core::types::new_id(),
            "user_id": user_id,
        }),
    )
    .await;
    assert_eq!(response.status(), 201, "workflow creation failed");
    body_json(response).await["data"].clone()
}
