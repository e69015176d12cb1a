//! Workflow state transition guards.
//!
//! Any status may be set by a client update; only three moves carry extra
//! rules. Moving to `active` requires satisfied dependencies, moving to
//! `completed` stamps `completed_at` (and fires the end action), and a
//! record left `waiting` is re-checked so it can resume.
//!
//! The functions here decide what must happen; the lifecycle in the API crate
//! runs the dependency lookups and persists the result.

use serde_json::Value;

use crate::dependency::DependencyReport;
use crate::status::WorkflowStatus;

/// Side effects an update must run for the status it requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateGuards {
    /// Run `can_proceed` before committing `status = active`.
    pub check_dependencies: bool,
    /// Set `completed_at` to now.
    pub stamp_completed_at: bool,
    /// Hand the template's end action to the executor.
    pub fire_end_action: bool,
}

impl UpdateGuards {
    /// Guards for an update moving `current` to `requested`. `None` means the
    /// update leaves the status alone.
    pub fn for_request(current: WorkflowStatus, requested: Option<WorkflowStatus>) -> Self {
        match requested {
            Some(WorkflowStatus::Active) => Self {
                check_dependencies: true,
                ..Self::default()
            },
            Some(WorkflowStatus::Completed) => Self {
                stamp_completed_at: true,
                fire_end_action: current != WorkflowStatus::Completed,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

/// Where a dependency check places a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub status: WorkflowStatus,
    /// New `pending_dependencies` value: `{}` when clear, otherwise the
    /// snapshot of what blocks progress.
    pub pending_dependencies: Value,
}

impl Placement {
    /// Placement after a check on creation or on a requested activation.
    /// Satisfied means `active` with nothing pending; otherwise `waiting`
    /// with the report snapshot.
    pub fn from_report(report: &DependencyReport) -> Self {
        if report.satisfied {
            Self::cleared()
        } else {
            Self {
                status: WorkflowStatus::Waiting,
                pending_dependencies: report.pending_snapshot(),
            }
        }
    }

    fn cleared() -> Self {
        Self {
            status: WorkflowStatus::Active,
            pending_dependencies: empty_pending(),
        }
    }
}

/// Whether a record in `resulting` status needs the resume check.
pub fn needs_resume_check(resulting: WorkflowStatus) -> bool {
    resulting == WorkflowStatus::Waiting
}

/// Outcome of the resume check: `Some` moves the record back to `active`,
/// `None` leaves it `waiting` with its existing snapshot.
pub fn resume(report: &DependencyReport) -> Option<Placement> {
    report.satisfied.then(Placement::cleared)
}

/// The "nothing pending" value stored in `pending_dependencies`.
pub fn empty_pending() -> Value {
    Value::Object(serde_json::Map::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
