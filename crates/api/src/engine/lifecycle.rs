//! Workflow instance lifecycle: creation, guarded updates, deletion.

use flowreg_core::dependency::{DependencyReport, ProceedDecision};
use flowreg_core::error::CoreError;
use flowreg_core::executor::ApiExecutor;
use flowreg_core::status::{WorkflowStatus, STATUS_ACTIVE};
use flowreg_core::transition::{empty_pending, needs_resume_check, resume, Placement, UpdateGuards};
use flowreg_core::types::DbId;
use flowreg_db::models::workflow::{CreateWorkflow, UpdateWorkflow, Workflow, WorkflowFilter};
use flowreg_db::repositories::{WorkflowRepo, WorkflowTemplateRepo};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgConnection;
use validator::Validate;

use crate::engine::resolver;
use crate::error::{AppError, AppResult, Rejection};

/// Result of [`update_workflow`].
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Workflow),
    /// Activation was refused. The record has been moved to `waiting` with
    /// the pending snapshot and nothing else; the caller commits and reports
    /// the refusal.
    Blocked {
        workflow: Workflow,
        decision: ProceedDecision,
    },
}

/// Dependency status of a stored workflow.
#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub workflow_id: DbId,
    pub status: String,
    #[serde(flatten)]
    pub report: DependencyReport,
    /// The snapshot currently stored on the record.
    pub pending_dependencies: Value,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Workflow",
        id,
    })
}

pub async fn get(conn: &mut PgConnection, id: DbId) -> AppResult<Workflow> {
    WorkflowRepo::find_by_id(conn, id)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn list(
    conn: &mut PgConnection,
    filter: &WorkflowFilter,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Workflow>> {
    if let Some(status) = &filter.status {
        WorkflowStatus::from_str_value(status)?;
    }
    let workflows = WorkflowRepo::list(conn, filter, limit, offset).await?;
    tracing::debug!(count = workflows.len(), "Listed workflows");
    Ok(workflows)
}

/// Partial unique index holding one open workflow per conversation.
const OPEN_CONVERSATION_INDEX: &str = "uq_workflows_open_conversation";

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.constraint())
        == Some(constraint)
}

fn conversation_occupied(conversation_id: DbId) -> Rejection {
    Rejection::conflict(
        "Active workflow exists",
        format!("Conversation {conversation_id} already has an active workflow"),
    )
    .with("conversation_id", conversation_id)
}

async fn persist_placement(
    conn: &mut PgConnection,
    id: DbId,
    placement: &Placement,
) -> AppResult<Workflow> {
    WorkflowRepo::set_placement(conn, id, placement.status.as_str(), &placement.pending_dependencies)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Create a workflow against an active template in an unoccupied
/// conversation, then place it by dependency check.
///
/// The record is inserted `active`; unmet dependencies move it to `waiting`
/// with the pending snapshot before the caller sees it.
pub async fn create_workflow(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    input: &CreateWorkflow,
) -> AppResult<Workflow> {
    input.validate()?;

    let template = WorkflowTemplateRepo::find_by_id(conn, input.template_id)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(
                "Template not found",
                format!("Workflow template {} not found", input.template_id),
            )
            .with("template_id", input.template_id)
        })?;

    if !template.is_active {
        return Err(Rejection::bad_request(
            "Template inactive",
            format!("Workflow template '{}' is not active", template.name),
        )
        .with("template_id", template.id)
        .into());
    }

    if let Some(existing) =
        WorkflowRepo::find_open_for_conversation(conn, input.conversation_id).await?
    {
        return Err(conversation_occupied(input.conversation_id)
            .with("existing_workflow_id", existing.id)
            .with("existing_workflow_status", &existing.status)
            .into());
    }

    // A concurrent creation that slipped past the check above trips the
    // partial unique index instead.
    let workflow = match WorkflowRepo::create(conn, input).await {
        Ok(workflow) => workflow,
        Err(err) if violates(&err, OPEN_CONVERSATION_INDEX) => {
            tracing::warn!(
                conversation_id = %input.conversation_id,
                "Concurrent workflow creation lost the conversation slot"
            );
            return Err(conversation_occupied(input.conversation_id).into());
        }
        Err(err) => return Err(err.into()),
    };

    let report = resolver::check_dependencies(conn, executor, &workflow).await?;
    let placement = Placement::from_report(&report);

    let workflow = if placement.status == WorkflowStatus::Active {
        workflow
    } else {
        tracing::warn!(
            workflow_id = %workflow.id,
            pending = report.pending.len(),
            "Workflow created waiting on dependencies"
        );
        persist_placement(conn, workflow.id, &placement).await?
    };

    tracing::info!(
        workflow_id = %workflow.id,
        template_id = %workflow.template_id,
        conversation_id = %workflow.conversation_id,
        status = %workflow.status,
        "Workflow created"
    );
    Ok(workflow)
}

/// Apply a partial update with the status guards.
///
/// - `status = active` runs `can_proceed`. If refused, only the move to
///   `waiting` with the snapshot is written, the rest of the update is
///   discarded, and [`UpdateOutcome::Blocked`] is returned.
/// - `status = completed` stamps `completed_at` and fires the template's end
///   action through the executor.
/// - A record left `waiting` is re-checked and resumed when satisfied.
pub async fn update_workflow(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    id: DbId,
    input: &UpdateWorkflow,
) -> AppResult<UpdateOutcome> {
    let current = get(conn, id).await?;
    let requested = input
        .status
        .as_deref()
        .map(WorkflowStatus::from_str_value)
        .transpose()?;
    let guards = UpdateGuards::for_request(current.status()?, requested);

    if guards.check_dependencies {
        let decision = resolver::can_proceed(conn, executor, &current).await?;
        if !decision.can_proceed {
            let placement = Placement::from_report(&decision.workflow_dependencies);
            let workflow = persist_placement(conn, id, &placement).await?;

            tracing::warn!(
                workflow_id = %id,
                pending = decision.workflow_dependencies.pending.len(),
                "Activation blocked by dependencies, workflow moved to waiting"
            );
            return Ok(UpdateOutcome::Blocked { workflow, decision });
        }
    }

    let mut workflow = WorkflowRepo::update(conn, id, input, guards.stamp_completed_at)
        .await?
        .ok_or_else(|| not_found(id))?;

    if guards.check_dependencies {
        workflow = WorkflowRepo::set_placement(conn, id, STATUS_ACTIVE, &empty_pending())
            .await?
            .ok_or_else(|| not_found(id))?;
    }

    if guards.fire_end_action {
        workflow = fire_end_action(conn, executor, workflow, input.end_action_result.is_some())
            .await?;
    }

    if needs_resume_check(workflow.status()?) {
        let report = resolver::check_dependencies(conn, executor, &workflow).await?;
        if let Some(placement) = resume(&report) {
            workflow = persist_placement(conn, id, &placement).await?;
            tracing::info!(workflow_id = %id, "Workflow resumed, dependencies satisfied");
        }
    }

    tracing::info!(workflow_id = %id, status = %workflow.status, "Workflow updated");
    Ok(UpdateOutcome::Updated(workflow))
}

/// Hand the template's end action to the executor and record any result,
/// unless the caller supplied `end_action_result` in the same update.
async fn fire_end_action(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    workflow: Workflow,
    caller_supplied_result: bool,
) -> AppResult<Workflow> {
    let Some(template) = WorkflowTemplateRepo::find_by_id(conn, workflow.template_id).await? else {
        return Ok(workflow);
    };
    let Some(action) = template.end_action() else {
        return Ok(workflow);
    };

    let result = executor.invoke(&action).await?;
    tracing::info!(
        workflow_id = %workflow.id,
        action_type = action.action_type.as_str(),
        recorded = result.is_some(),
        "End action invoked"
    );

    match result {
        Some(value) if !caller_supplied_result => {
            WorkflowRepo::set_end_action_result(conn, workflow.id, &value)
                .await?
                .ok_or_else(|| not_found(workflow.id))
        }
        _ => Ok(workflow),
    }
}

/// Hard-delete a workflow.
pub async fn delete_workflow(conn: &mut PgConnection, id: DbId) -> AppResult<()> {
    if !WorkflowRepo::delete(conn, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(workflow_id = %id, "Workflow deleted");
    Ok(())
}

/// Current dependency verdict for a workflow, alongside its stored snapshot.
pub async fn dependency_status(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    id: DbId,
) -> AppResult<DependencyStatus> {
    let workflow = get(conn, id).await?;
    let report = resolver::check_dependencies(conn, executor, &workflow).await?;
    Ok(DependencyStatus {
        workflow_id: workflow.id,
        status: workflow.status,
        report,
        pending_dependencies: workflow.pending_dependencies,
    })
}
