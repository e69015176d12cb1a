//! HTTP-level integration tests for user-type permission grants.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, create_template, delete, get, post_json, template_body};
use flowreg_core::types::new_id;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_is_idempotent(pool: PgPool) {
    let template = create_template(&pool, template_body("orders")).await;
    let body = json!({"user_type_id": new_id(), "workflow_template_id": template["id"]});

    let first = post_json(build_test_app(pool.clone()), "/api/permissions", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;

    let second = post_json(build_test_app(pool), "/api/permissions", body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;

    assert_eq!(first["data"]["id"], second["data"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_for_unknown_template_returns_404(pool: PgPool) {
    let response = post_json(
        build_test_app(pool),
        "/api/permissions",
        json!({"user_type_id": new_id(), "workflow_template_id": new_id()}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Template not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_then_revoke_again_returns_404(pool: PgPool) {
    let template = create_template(&pool, template_body("orders")).await;
    let user_type_id = new_id();
    let template_id = template["id"].as_str().unwrap();
    post_json(
        build_test_app(pool.clone()),
        "/api/permissions",
        json!({"user_type_id": user_type_id, "workflow_template_id": template_id}),
    )
    .await;

    let uri = format!("/api/permissions?user_type_id={user_type_id}&workflow_template_id={template_id}");
    let response = delete(build_test_app(pool.clone()), &uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(build_test_app(pool), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Permission not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_for_unknown_template_returns_404(pool: PgPool) {
    let uri = format!(
        "/api/permissions?user_type_id={}&workflow_template_id={}",
        new_id(),
        new_id()
    );
    let response = delete(build_test_app(pool), &uri).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Template not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_by_user_type_and_template(pool: PgPool) {
    let user_type_id = new_id();
    let active = create_template(&pool, template_body("active")).await;
    let mut inactive = template_body("inactive");
    inactive["is_active"] = json!(false);
    let inactive = create_template(&pool, inactive).await;

    for template in [&active, &inactive] {
        post_json(
            build_test_app(pool.clone()),
            "/api/permissions",
            json!({"user_type_id": user_type_id, "workflow_template_id": template["id"]}),
        )
        .await;
    }

    let json = body_json(
        get(build_test_app(pool.clone()), &format!("/api/permissions/user-type/{user_type_id}")).await,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(
        get(
            build_test_app(pool.clone()),
            &format!("/api/permissions/user-type/{user_type_id}?is_active=true"),
        )
        .await,
    )
    .await;
    let grants = json["data"].as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["workflow_template_id"], active["id"]);

    let template_id = active["id"].as_str().unwrap();
    let json = body_json(
        get(
            build_test_app(pool.clone()),
            &format!("/api/permissions/workflow-template/{template_id}"),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"][0]["user_type_id"], user_type_id.to_string());

    let response = get(
        build_test_app(pool),
        &format!("/api/permissions/workflow-template/{}", new_id()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_user_type_has_no_grants(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        &format!("/api/permissions/user-type/{}", new_id()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}
