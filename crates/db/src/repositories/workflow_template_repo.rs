//! Repository for the `workflow_templates` table.

use flowreg_core::types::{new_id, DbId};
use sqlx::PgConnection;

use crate::models::workflow_template::{
    CreateWorkflowTemplate, TemplateFilter, UpdateWorkflowTemplate, WorkflowTemplate,
};

/// Column list for workflow_templates queries.
const COLUMNS: &str = "id, name, description, category, state_schema, workflow_dependencies, \
    end_action_type, end_action_target, guidelines, workflow_metadata, is_active, \
    created_at, updated_at";

/// Same columns, qualified with the `t` alias for JOIN queries.
const T_COLUMNS: &str = "t.id, t.name, t.description, t.category, t.state_schema, \
    t.workflow_dependencies, t.end_action_type, t.end_action_target, t.guidelines, \
    t.workflow_metadata, t.is_active, t.created_at, t.updated_at";

/// Provides CRUD operations for workflow templates.
pub struct WorkflowTemplateRepo;

impl WorkflowTemplateRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateWorkflowTemplate,
    ) -> Result<WorkflowTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflow_templates
                (id, name, description, category, state_schema, workflow_dependencies,
                 end_action_type, end_action_target, guidelines, workflow_metadata, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(new_id())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.state_schema)
            .bind(&input.workflow_dependencies)
            .bind(&input.end_action_type)
            .bind(&input.end_action_target)
            .bind(&input.guidelines)
            .bind(&input.workflow_metadata)
            .bind(input.is_active)
            .fetch_one(conn)
            .await
    }

    /// Find a template by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflow_templates WHERE id = $1");
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a template by its exact name.
    pub async fn find_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflow_templates WHERE name = $1");
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    /// List templates with optional filters, ordered by name.
    pub async fn list(
        conn: &mut PgConnection,
        filter: &TemplateFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_templates
             WHERE ($1::TEXT IS NULL OR category = $1)
               AND ($2::BOOL IS NULL OR is_active = $2)
               AND ($3::TEXT IS NULL OR name ILIKE $3 OR description ILIKE $3)
             ORDER BY name ASC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(&filter.category)
            .bind(filter.is_active)
            .bind(&filter.search_pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    /// Active templates granted to a user type, optionally narrowed further
    /// by `is_active`.
    pub async fn list_for_user_type(
        conn: &mut PgConnection,
        user_type_id: DbId,
        is_active: Option<bool>,
    ) -> Result<Vec<WorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {T_COLUMNS} FROM workflow_templates t
             JOIN user_type_workflow_templates p ON p.workflow_template_id = t.id
             WHERE p.user_type_id = $1
               AND t.is_active = true
               AND ($2::BOOL IS NULL OR t.is_active = $2)
             ORDER BY t.name ASC"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(user_type_id)
            .bind(is_active)
            .fetch_all(conn)
            .await
    }

    /// Apply a partial update, returning the updated row.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateWorkflowTemplate,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE workflow_templates SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                state_schema = COALESCE($5, state_schema),
                workflow_dependencies = CASE WHEN $6 THEN $7 ELSE workflow_dependencies END,
                end_action_type = COALESCE($8, end_action_type),
                end_action_target = CASE WHEN $9 THEN $10 ELSE end_action_target END,
                guidelines = COALESCE($11, guidelines),
                workflow_metadata = COALESCE($12, workflow_metadata),
                is_active = COALESCE($13, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.state_schema)
            .bind(input.workflow_dependencies.is_some())
            .bind(input.workflow_dependencies.clone().flatten())
            .bind(&input.end_action_type)
            .bind(input.end_action_target.is_some())
            .bind(input.end_action_target.clone().flatten())
            .bind(&input.guidelines)
            .bind(&input.workflow_metadata)
            .bind(input.is_active)
            .fetch_optional(conn)
            .await
    }

    /// Delete a template by ID. Returns `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
