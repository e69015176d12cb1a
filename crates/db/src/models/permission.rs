//! User-type permission grant model.

use flowreg_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `user_type_workflow_templates` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserTypeWorkflowTemplate {
    pub id: DbId,
    pub user_type_id: DbId,
    pub workflow_template_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for granting a user type access to a template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserTypeWorkflowTemplate {
    pub user_type_id: DbId,
    pub workflow_template_id: DbId,
}
