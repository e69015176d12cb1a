//! Workflow instance model.

use flowreg_core::error::CoreError;
use flowreg_core::status::WorkflowStatus;
use flowreg_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `workflows` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Workflow {
    pub id: DbId,
    pub template_id: DbId,
    pub conversation_id: DbId,
    pub user_id: String,
    pub status: String,
    pub state_data: Value,
    pub pending_dependencies: Value,
    pub end_action_result: Option<Value>,
    pub workflow_metadata: Option<Value>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub last_interaction_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Workflow {
    /// The stored status, parsed.
    pub fn status(&self) -> Result<WorkflowStatus, CoreError> {
        WorkflowStatus::from_str_value(&self.status)
    }
}

/// DTO for creating a workflow instance.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkflow {
    pub template_id: DbId,
    pub conversation_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub user_id: String,
    pub state_data: Option<Value>,
    pub workflow_metadata: Option<Value>,
}

/// DTO for a partial workflow update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkflow {
    pub status: Option<String>,
    pub state_data: Option<Value>,
    pub end_action_result: Option<Value>,
    pub workflow_metadata: Option<Value>,
}

/// Filters for listing workflows.
#[derive(Debug, Clone, Default)]
pub struct WorkflowFilter {
    pub conversation_id: Option<DbId>,
    pub user_id: Option<String>,
    pub template_id: Option<DbId>,
    pub status: Option<String>,
    /// Pre-built `ILIKE` pattern matched against `workflow_metadata` text.
    pub search_pattern: Option<String>,
}
