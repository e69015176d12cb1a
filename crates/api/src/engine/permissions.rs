//! Permission store: which user types may use which templates.

use flowreg_core::types::DbId;
use flowreg_db::models::permission::{CreateUserTypeWorkflowTemplate, UserTypeWorkflowTemplate};
use flowreg_db::models::workflow_template::WorkflowTemplate;
use flowreg_db::repositories::{PermissionRepo, WorkflowTemplateRepo};
use sqlx::PgConnection;

use crate::error::{AppResult, Rejection};

/// Result of a grant: the association and whether this call created it.
#[derive(Debug)]
pub struct Grant {
    pub permission: UserTypeWorkflowTemplate,
    pub created: bool,
}

fn template_not_found(template_id: DbId) -> Rejection {
    Rejection::not_found(
        "Template not found",
        format!("Workflow template {template_id} not found"),
    )
    .with("workflow_template_id", template_id)
}

async fn ensure_template_exists(conn: &mut PgConnection, template_id: DbId) -> AppResult<()> {
    WorkflowTemplateRepo::find_by_id(conn, template_id)
        .await?
        .ok_or_else(|| template_not_found(template_id))?;
    Ok(())
}

/// Grant a user type access to a template. Idempotent: an existing grant is
/// returned unchanged.
pub async fn grant(
    conn: &mut PgConnection,
    input: &CreateUserTypeWorkflowTemplate,
) -> AppResult<Grant> {
    ensure_template_exists(conn, input.workflow_template_id).await?;

    if let Some(permission) =
        PermissionRepo::find_pair(conn, input.user_type_id, input.workflow_template_id).await?
    {
        return Ok(Grant {
            permission,
            created: false,
        });
    }

    let permission = PermissionRepo::create(conn, input).await?;
    tracing::info!(
        user_type_id = %input.user_type_id,
        workflow_template_id = %input.workflow_template_id,
        "Permission granted"
    );
    Ok(Grant {
        permission,
        created: true,
    })
}

/// Revoke a grant. 404 if the template or the grant does not exist.
pub async fn revoke(
    conn: &mut PgConnection,
    user_type_id: DbId,
    workflow_template_id: DbId,
) -> AppResult<()> {
    ensure_template_exists(conn, workflow_template_id).await?;

    let deleted = PermissionRepo::delete_pair(conn, user_type_id, workflow_template_id).await?;
    if !deleted {
        return Err(Rejection::not_found(
            "Permission not found",
            "User type does not have access to this template",
        )
        .with("user_type_id", user_type_id)
        .with("workflow_template_id", workflow_template_id)
        .into());
    }

    tracing::info!(
        user_type_id = %user_type_id,
        workflow_template_id = %workflow_template_id,
        "Permission revoked"
    );
    Ok(())
}

/// Grants held by a user type. An unknown user type yields an empty list.
pub async fn list_for_user_type(
    conn: &mut PgConnection,
    user_type_id: DbId,
    is_active: Option<bool>,
) -> AppResult<Vec<UserTypeWorkflowTemplate>> {
    Ok(PermissionRepo::list_for_user_type(conn, user_type_id, is_active).await?)
}

/// Grants for a template. 404 if the template does not exist.
pub async fn list_for_template(
    conn: &mut PgConnection,
    workflow_template_id: DbId,
) -> AppResult<Vec<UserTypeWorkflowTemplate>> {
    ensure_template_exists(conn, workflow_template_id).await?;
    Ok(PermissionRepo::list_for_template(conn, workflow_template_id).await?)
}

/// Active templates available to a user type.
pub async fn templates_for_user_type(
    conn: &mut PgConnection,
    user_type_id: DbId,
    is_active: Option<bool>,
) -> AppResult<Vec<WorkflowTemplate>> {
    let templates = WorkflowTemplateRepo::list_for_user_type(conn, user_type_id, is_active).await?;
    tracing::debug!(user_type_id = %user_type_id, count = templates.len(), "Listed templates for user type");
    Ok(templates)
}
