//! Repository for the `user_type_workflow_templates` table.

use flowreg_core::types::{new_id, DbId};
use sqlx::PgConnection;

use crate::models::permission::{CreateUserTypeWorkflowTemplate, UserTypeWorkflowTemplate};

/// Column list for user_type_workflow_templates queries.
const COLUMNS: &str = "id, user_type_id, workflow_template_id, created_at, updated_at";

/// Provides grant/revoke operations for user-type template permissions.
pub struct PermissionRepo;

impl PermissionRepo {
    /// Find the grant for a (user type, template) pair.
    pub async fn find_pair(
        conn: &mut PgConnection,
        user_type_id: DbId,
        workflow_template_id: DbId,
    ) -> Result<Option<UserTypeWorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_type_workflow_templates
             WHERE user_type_id = $1 AND workflow_template_id = $2"
        );
        sqlx::query_as::<_, UserTypeWorkflowTemplate>(&query)
            .bind(user_type_id)
            .bind(workflow_template_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a grant, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateUserTypeWorkflowTemplate,
    ) -> Result<UserTypeWorkflowTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_type_workflow_templates (id, user_type_id, workflow_template_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserTypeWorkflowTemplate>(&query)
            .bind(new_id())
            .bind(input.user_type_id)
            .bind(input.workflow_template_id)
            .fetch_one(conn)
            .await
    }

    /// Delete the grant for a pair. Returns `true` if a row was deleted.
    pub async fn delete_pair(
        conn: &mut PgConnection,
        user_type_id: DbId,
        workflow_template_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_type_workflow_templates
             WHERE user_type_id = $1 AND workflow_template_id = $2",
        )
        .bind(user_type_id)
        .bind(workflow_template_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Grants held by a user type. With `is_active` set, only grants whose
    /// template has that active flag.
    pub async fn list_for_user_type(
        conn: &mut PgConnection,
        user_type_id: DbId,
        is_active: Option<bool>,
    ) -> Result<Vec<UserTypeWorkflowTemplate>, sqlx::Error> {
        let query = "SELECT p.id, p.user_type_id, p.workflow_template_id, p.created_at, p.updated_at
             FROM user_type_workflow_templates p
             JOIN workflow_templates t ON t.id = p.workflow_template_id
             WHERE p.user_type_id = $1
               AND ($2::BOOL IS NULL OR t.is_active = $2)
             ORDER BY p.created_at ASC";
        sqlx::query_as::<_, UserTypeWorkflowTemplate>(query)
            .bind(user_type_id)
            .bind(is_active)
            .fetch_all(conn)
            .await
    }

    /// Grants for a template.
    pub async fn list_for_template(
        conn: &mut PgConnection,
        workflow_template_id: DbId,
    ) -> Result<Vec<UserTypeWorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_type_workflow_templates
             WHERE workflow_template_id = $1
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, UserTypeWorkflowTemplate>(&query)
            .bind(workflow_template_id)
            .fetch_all(conn)
            .await
    }
}
