//! Integration tests for template, workflow and permission repositories.
//!
//! Exercises the repository layer against a real database:
//! - Template create / lookup / partial update with explicit nulls
//! - Workflow dependency lookups scoped by user, latest completion first
//! - `completed_at` stamping
//! - Open-conversation partial unique index
//! - Permission grant cascade on template delete

use flowreg_core::types::new_id;
use flowreg_db::models::permission::CreateUserTypeWorkflowTemplate;
use flowreg_db::models::workflow::{CreateWorkflow, UpdateWorkflow, WorkflowFilter};
use flowreg_db::models::workflow_template::{
    CreateWorkflowTemplate, TemplateFilter, UpdateWorkflowTemplate,
};
use flowreg_db::repositories::{PermissionRepo, WorkflowRepo, WorkflowTemplateRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_template(name: &str) -> CreateWorkflowTemplate {
    CreateWorkflowTemplate {
        name: name.to_string(),
        description: None,
        category: None,
        state_schema: json!({"type": "object"}),
        workflow_dependencies: None,
        end_action_type: "none".to_string(),
        end_action_target: None,
        guidelines: None,
        workflow_metadata: None,
        is_active: None,
    }
}

fn new_workflow(template_id: uuid::Uuid, user_id: &str) -> CreateWorkflow {
    CreateWorkflow {
        template_id,
        conversation_id: new_id(),
        user_id: user_id.to_string(),
        state_data: None,
        workflow_metadata: None,
    }
}

fn completing() -> UpdateWorkflow {
    UpdateWorkflow {
        status: Some("completed".to_string()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_create_and_lookup(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    assert!(created.is_active);
    assert_eq!(created.end_action_type, "none");

    let by_id = WorkflowTemplateRepo::find_by_id(&mut conn, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.name, "orders");

    let by_name = WorkflowTemplateRepo::find_by_name(&mut conn, "orders")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, created.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_duplicate_name_violates_unique(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let err = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap_err();

    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_workflow_templates_name"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_update_clears_target_with_null(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut input = new_template("hooks");
    input.end_action_type = "api_call".to_string();
    input.end_action_target = Some(json!({"endpoint": "https://hooks.example.com", "method": "POST"}));
    let created = WorkflowTemplateRepo::create(&mut conn, &input).await.unwrap();

    let update: UpdateWorkflowTemplate =
        serde_json::from_value(json!({"end_action_type": "none", "end_action_target": null}))
            .unwrap();
    let updated = WorkflowTemplateRepo::update(&mut conn, created.id, &update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.end_action_type, "none");
    assert_eq!(updated.end_action_target, None);

    // Absent keys leave values alone.
    let touch: UpdateWorkflowTemplate =
        serde_json::from_value(json!({"description": "Outbound hooks"})).unwrap();
    let touched = WorkflowTemplateRepo::update(&mut conn, created.id, &touch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(touched.description.as_deref(), Some("Outbound hooks"));
    assert_eq!(touched.end_action_type, "none");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_list_filters_and_search(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut sales = new_template("orders");
    sales.category = Some("sales".to_string());
    WorkflowTemplateRepo::create(&mut conn, &sales).await.unwrap();
    let mut support = new_template("refund_100%");
    support.category = Some("support".to_string());
    WorkflowTemplateRepo::create(&mut conn, &support).await.unwrap();

    let filter = TemplateFilter {
        category: Some("sales".to_string()),
        ..Default::default()
    };
    let listed = WorkflowTemplateRepo::list(&mut conn, &filter, 100, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "orders");

    let filter = TemplateFilter {
        search_pattern: flowreg_core::search::ilike_pattern(Some("100%")),
        ..Default::default()
    };
    let listed = WorkflowTemplateRepo::list(&mut conn, &filter, 100, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "refund_100%");
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn workflow_create_defaults(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let workflow = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();

    assert_eq!(workflow.status, "active");
    assert_eq!(workflow.state_data, json!({}));
    assert_eq!(workflow.pending_dependencies, json!({}));
    assert!(workflow.completed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn workflow_completion_stamps_completed_at(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let workflow = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();

    let updated = WorkflowRepo::update(&mut conn, workflow.id, &completing(), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, "completed");
    assert!(updated.completed_at.is_some());
    assert!(updated.last_interaction_at >= workflow.last_interaction_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_open_workflow_in_conversation_rejected(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let first = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();

    let mut second = new_workflow(template.id, "u1");
    second.conversation_id = first.conversation_id;
    let err = WorkflowRepo::create(&mut conn, &second).await.unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_workflows_open_conversation"));

    // Once the first one is terminal the slot is free.
    WorkflowRepo::update(&mut conn, first.id, &completing(), true)
        .await
        .unwrap();
    WorkflowRepo::create(&mut conn, &second).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dependency_lookups_scope_by_user(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("kyc"))
        .await
        .unwrap();

    let mine = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();
    WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u2"))
        .await
        .unwrap();

    let open = WorkflowRepo::find_open_for_dependency(&mut conn, "u1", "kyc")
        .await
        .unwrap();
    assert_eq!(open, Some(mine.id));
    assert_eq!(
        WorkflowRepo::find_latest_completed_for_dependency(&mut conn, "u1", "kyc")
            .await
            .unwrap(),
        None
    );

    WorkflowRepo::update(&mut conn, mine.id, &completing(), true)
        .await
        .unwrap();

    // Matches by template id as well as by name.
    let by_id = template.id.to_string();
    assert_eq!(
        WorkflowRepo::find_latest_completed_for_dependency(&mut conn, "u1", &by_id)
            .await
            .unwrap(),
        Some(mine.id)
    );
    assert_eq!(
        WorkflowRepo::find_latest_completed_for_dependency(&mut conn, "u3", "kyc")
            .await
            .unwrap(),
        None
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn latest_completion_wins_dependency_lookup(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("kyc"))
        .await
        .unwrap();
    let older = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();
    let newer = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();
    for id in [older.id, newer.id] {
        WorkflowRepo::update(&mut conn, id, &completing(), true)
            .await
            .unwrap();
    }

    // The first-created workflow finished last.
    sqlx::query("UPDATE workflows SET completed_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(newer.id)
        .execute(&mut *conn)
        .await
        .unwrap();

    let latest = WorkflowRepo::find_latest_completed_for_dependency(&mut conn, "u1", "kyc")
        .await
        .unwrap();
    assert_eq!(latest, Some(older.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_at_only_stamped_on_request(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let workflow = WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u1"))
        .await
        .unwrap();

    let cancelling = UpdateWorkflow {
        status: Some("cancelled".to_string()),
        ..Default::default()
    };
    let cancelled = WorkflowRepo::update(&mut conn, workflow.id, &cancelling, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");
    assert!(cancelled.completed_at.is_none());

    let completed = WorkflowRepo::update(&mut conn, workflow.id, &completing(), true)
        .await
        .unwrap()
        .unwrap();
    let first_stamp = completed.completed_at.unwrap();

    // A later update that does not ask for a stamp keeps the original one.
    let touch = UpdateWorkflow {
        state_data: Some(json!({"note": "after"})),
        ..Default::default()
    };
    let touched = WorkflowRepo::update(&mut conn, workflow.id, &touch, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(touched.completed_at, Some(first_stamp));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn workflow_list_filters(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let mut tagged = new_workflow(template.id, "u1");
    tagged.workflow_metadata = Some(json!({"channel": "whatsapp"}));
    WorkflowRepo::create(&mut conn, &tagged).await.unwrap();
    WorkflowRepo::create(&mut conn, &new_workflow(template.id, "u2"))
        .await
        .unwrap();

    let by_user = WorkflowFilter {
        user_id: Some("u2".to_string()),
        ..Default::default()
    };
    assert_eq!(WorkflowRepo::list(&mut conn, &by_user, 100, 0).await.unwrap().len(), 1);

    let by_metadata = WorkflowFilter {
        search_pattern: flowreg_core::search::ilike_pattern(Some("whatsapp")),
        ..Default::default()
    };
    let listed = WorkflowRepo::list(&mut conn, &by_metadata, 100, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_id, "u1");

    assert_eq!(
        WorkflowRepo::count_open_for_template(&mut conn, template.id)
            .await
            .unwrap(),
        2
    );
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn permissions_cascade_with_template(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let template = WorkflowTemplateRepo::create(&mut conn, &new_template("orders"))
        .await
        .unwrap();
    let user_type_id = new_id();
    PermissionRepo::create(
        &mut conn,
        &CreateUserTypeWorkflowTemplate {
            user_type_id,
            workflow_template_id: template.id,
        },
    )
    .await
    .unwrap();

    let granted = WorkflowTemplateRepo::list_for_user_type(&mut conn, user_type_id, None)
        .await
        .unwrap();
    assert_eq!(granted.len(), 1);

    assert!(WorkflowTemplateRepo::delete(&mut conn, template.id).await.unwrap());
    let remaining = PermissionRepo::list_for_user_type(&mut conn, user_type_id, None)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}
