//! Repository for the `workflows` table.

use flowreg_core::status::STATUS_ACTIVE;
use flowreg_core::types::{new_id, DbId};
use serde_json::Value;
use sqlx::PgConnection;

use crate::models::workflow::{CreateWorkflow, UpdateWorkflow, Workflow, WorkflowFilter};

/// Column list for workflows queries.
const COLUMNS: &str = "id, template_id, conversation_id, user_id, status, state_data, \
    pending_dependencies, end_action_result, workflow_metadata, started_at, completed_at, \
    last_interaction_at, created_at, updated_at";

/// Provides CRUD and dependency lookups for workflow instances.
pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Insert a new workflow in `active` status, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateWorkflow,
    ) -> Result<Workflow, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflows
                (id, template_id, conversation_id, user_id, status, state_data, workflow_metadata)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb), $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(new_id())
            .bind(input.template_id)
            .bind(input.conversation_id)
            .bind(&input.user_id)
            .bind(STATUS_ACTIVE)
            .bind(&input.state_data)
            .bind(&input.workflow_metadata)
            .fetch_one(conn)
            .await
    }

    /// Find a workflow by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows WHERE id = $1");
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The `active` or `waiting` workflow occupying a conversation, if any.
    pub async fn find_open_for_conversation(
        conn: &mut PgConnection,
        conversation_id: DbId,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflows
             WHERE conversation_id = $1 AND status IN ('active', 'waiting')
             LIMIT 1"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(conversation_id)
            .fetch_optional(conn)
            .await
    }

    /// Count `active` or `waiting` workflows referencing a template.
    pub async fn count_open_for_template(
        conn: &mut PgConnection,
        template_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM workflows
             WHERE template_id = $1 AND status IN ('active', 'waiting')",
        )
        .bind(template_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Most recently completed workflow of `user_id` whose template matches
    /// `identifier` by name or id.
    pub async fn find_latest_completed_for_dependency(
        conn: &mut PgConnection,
        user_id: &str,
        identifier: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT w.id FROM workflows w
             JOIN workflow_templates t ON t.id = w.template_id
             WHERE w.user_id = $1
               AND (t.name = $2 OR t.id::text = $2)
               AND w.status = 'completed'
             ORDER BY w.completed_at DESC NULLS LAST
             LIMIT 1",
        )
        .bind(user_id)
        .bind(identifier)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Any `active` or `waiting` workflow of `user_id` whose template matches
    /// `identifier` by name or id.
    pub async fn find_open_for_dependency(
        conn: &mut PgConnection,
        user_id: &str,
        identifier: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT w.id FROM workflows w
             JOIN workflow_templates t ON t.id = w.template_id
             WHERE w.user_id = $1
               AND (t.name = $2 OR t.id::text = $2)
               AND w.status IN ('active', 'waiting')
             ORDER BY w.created_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(identifier)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// List workflows with optional filters, newest first.
    pub async fn list(
        conn: &mut PgConnection,
        filter: &WorkflowFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Workflow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflows
             WHERE ($1::UUID IS NULL OR conversation_id = $1)
               AND ($2::TEXT IS NULL OR user_id = $2)
               AND ($3::UUID IS NULL OR template_id = $3)
               AND ($4::TEXT IS NULL OR status = $4)
               AND ($5::TEXT IS NULL OR workflow_metadata::text ILIKE $5)
             ORDER BY created_at DESC
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(filter.conversation_id)
            .bind(&filter.user_id)
            .bind(filter.template_id)
            .bind(&filter.status)
            .bind(&filter.search_pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    /// Apply a partial update and stamp `last_interaction_at`.
    ///
    /// `stamp_completed_at` sets `completed_at` to now in the same statement.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateWorkflow,
        stamp_completed_at: bool,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET
                status = COALESCE($2, status),
                state_data = COALESCE($3, state_data),
                end_action_result = COALESCE($4, end_action_result),
                workflow_metadata = COALESCE($5, workflow_metadata),
                completed_at = CASE WHEN $6 THEN NOW() ELSE completed_at END,
                last_interaction_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(&input.status)
            .bind(&input.state_data)
            .bind(&input.end_action_result)
            .bind(&input.workflow_metadata)
            .bind(stamp_completed_at)
            .fetch_optional(conn)
            .await
    }

    /// Set status and the pending-dependency snapshot together.
    pub async fn set_placement(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
        pending_dependencies: &Value,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET status = $2, pending_dependencies = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(status)
            .bind(pending_dependencies)
            .fetch_optional(conn)
            .await
    }

    /// Record the value returned by an end action.
    pub async fn set_end_action_result(
        conn: &mut PgConnection,
        id: DbId,
        result: &Value,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET end_action_result = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(result)
            .fetch_optional(conn)
            .await
    }

    /// Hard-delete a workflow. Returns `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
