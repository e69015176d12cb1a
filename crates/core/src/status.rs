//! Workflow instance status values.
//!
//! Statuses are stored as text (`workflows.status`, guarded by a `CHECK`
//! constraint) and parsed into [`WorkflowStatus`] at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_WAITING: &str = "waiting";

/// All valid status strings.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_ACTIVE,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
    STATUS_FAILED,
    STATUS_WAITING,
];

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Active,
    Completed,
    Cancelled,
    Failed,
    Waiting,
}

impl WorkflowStatus {
    /// Parse a stored or client-supplied status value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_ACTIVE => Ok(Self::Active),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            STATUS_FAILED => Ok(Self::Failed),
            STATUS_WAITING => Ok(Self::Waiting),
            _ => Err(CoreError::Validation(format!(
                "status: invalid value '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// The stored string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => STATUS_ACTIVE,
            Self::Completed => STATUS_COMPLETED,
            Self::Cancelled => STATUS_CANCELLED,
            Self::Failed => STATUS_FAILED,
            Self::Waiting => STATUS_WAITING,
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
