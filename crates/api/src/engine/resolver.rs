//! Dependency resolver.
//!
//! Decides whether a workflow's declared dependencies are satisfied for its
//! user. Workflow-kind entries are matched against the same user's workflows
//! (any conversation) by template name or id; API-kind entries are delegated
//! to the [`ApiExecutor`], and stay unsatisfied when their `api` block cannot
//! be decoded.

use flowreg_core::dependency::{
    api_unconfigured, api_verdict, normalize_dependencies, workflow_verdict, DependencyKind,
    DependencyReport, ProceedDecision,
};
use flowreg_core::executor::ApiExecutor;
use flowreg_db::models::workflow::Workflow;
use flowreg_db::repositories::{WorkflowRepo, WorkflowTemplateRepo};
use sqlx::PgConnection;

use crate::error::AppResult;

/// Check every dependency declared by the workflow's template.
///
/// A missing template yields an unsatisfied report with an error marker.
pub async fn check_dependencies(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    workflow: &Workflow,
) -> AppResult<DependencyReport> {
    let Some(template) = WorkflowTemplateRepo::find_by_id(conn, workflow.template_id).await? else {
        tracing::warn!(
            workflow_id = %workflow.id,
            template_id = %workflow.template_id,
            "Dependency check on workflow with missing template"
        );
        return Ok(DependencyReport::template_missing());
    };

    let dependencies = normalize_dependencies(template.workflow_dependencies.as_ref());
    if dependencies.is_empty() {
        return Ok(DependencyReport::no_dependencies());
    }

    let mut checks = Vec::with_capacity(dependencies.len());
    for dep in &dependencies {
        let check = match dep.kind {
            DependencyKind::Workflow => {
                let completed = WorkflowRepo::find_latest_completed_for_dependency(
                    conn,
                    &workflow.user_id,
                    &dep.identifier,
                )
                .await?;
                let in_progress = match completed {
                    Some(_) => None,
                    None => {
                        WorkflowRepo::find_open_for_dependency(
                            conn,
                            &workflow.user_id,
                            &dep.identifier,
                        )
                        .await?
                    }
                };
                workflow_verdict(&dep.identifier, completed, in_progress)
            }
            DependencyKind::Api => {
                match &dep.api {
                    Some(config) => api_verdict(&dep.identifier, executor.check(config).await?),
                    None => api_unconfigured(&dep.identifier),
                }
            }
        };
        checks.push(check);
    }

    let report = DependencyReport::from_checks(checks);
    tracing::debug!(
        workflow_id = %workflow.id,
        declared = dependencies.len(),
        pending = report.pending.len(),
        satisfied = report.satisfied,
        "Checked workflow dependencies"
    );
    Ok(report)
}

/// Whether the workflow may move to `active`.
pub async fn can_proceed(
    conn: &mut PgConnection,
    executor: &dyn ApiExecutor,
    workflow: &Workflow,
) -> AppResult<ProceedDecision> {
    let report = check_dependencies(conn, executor, workflow).await?;
    Ok(ProceedDecision::from_report(report))
}
