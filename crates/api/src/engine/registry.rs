//! Template registry: registration, lookup, update and guarded deletion.

use flowreg_core::error::CoreError;
use flowreg_core::template::{validate_template_name, validate_template_shape};
use flowreg_core::types::DbId;
use flowreg_db::models::workflow_template::{
    CreateWorkflowTemplate, TemplateFilter, UpdateWorkflowTemplate, WorkflowTemplate,
};
use flowreg_db::repositories::{WorkflowRepo, WorkflowTemplateRepo};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgConnection;
use validator::Validate;

use crate::error::{AppError, AppResult, Rejection};

/// Load a template or fail with 404.
pub async fn get(conn: &mut PgConnection, id: DbId) -> AppResult<WorkflowTemplate> {
    WorkflowTemplateRepo::find_by_id(conn, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkflowTemplate",
            id,
        }))
}

/// Look a template up by name. Surrounding whitespace is ignored.
pub async fn get_by_name(conn: &mut PgConnection, name: &str) -> AppResult<WorkflowTemplate> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Template name must not be empty".into()));
    }
    WorkflowTemplateRepo::find_by_name(conn, name)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(
                "Template not found",
                format!("Workflow template '{name}' not found"),
            )
            .with("name", name)
            .into()
        })
}

pub async fn list(
    conn: &mut PgConnection,
    filter: &TemplateFilter,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<WorkflowTemplate>> {
    let templates = WorkflowTemplateRepo::list(conn, filter, limit, offset).await?;
    tracing::debug!(count = templates.len(), "Listed workflow templates");
    Ok(templates)
}

/// Field-level and structural checks for a new template.
fn validate_new(input: &CreateWorkflowTemplate) -> Result<(), CoreError> {
    validate_template_name(&input.name)?;
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    validate_template_shape(&input.shape())
}

fn duplicate_name(name: &str, existing_id: DbId) -> Rejection {
    Rejection::conflict(
        "Template already exists",
        format!("Workflow template with name '{name}' already exists"),
    )
    .with("existing_template_id", existing_id)
}

/// Register a new template after structural validation.
///
/// A taken name yields 409 carrying `existing_template_id`.
pub async fn register(
    conn: &mut PgConnection,
    input: &CreateWorkflowTemplate,
) -> AppResult<WorkflowTemplate> {
    validate_new(input)?;

    if let Some(existing) = WorkflowTemplateRepo::find_by_name(conn, &input.name).await? {
        return Err(duplicate_name(&input.name, existing.id).into());
    }

    let template = WorkflowTemplateRepo::create(conn, input).await?;
    tracing::info!(template_id = %template.id, name = %template.name, "Workflow template created");
    Ok(template)
}

/// Apply a partial update.
///
/// The merged record is re-validated only when a structural field
/// (`state_schema`, `workflow_dependencies`, `end_action_type`,
/// `end_action_target`) is present in the update.
pub async fn update(
    conn: &mut PgConnection,
    id: DbId,
    input: &UpdateWorkflowTemplate,
) -> AppResult<WorkflowTemplate> {
    let current = get(conn, id).await?;

    if let Some(name) = &input.name {
        validate_template_name(name)?;
    }
    input.validate()?;

    if let Some(name) = input.name.as_deref().filter(|n| *n != current.name) {
        if let Some(existing) = WorkflowTemplateRepo::find_by_name(conn, name).await? {
            return Err(duplicate_name(name, existing.id).into());
        }
    }

    if input.touches_shape() {
        let merged = input.merged_into(&current);
        validate_template_shape(&merged.shape())?;
    }

    let template = WorkflowTemplateRepo::update(conn, id, input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkflowTemplate",
            id,
        }))?;
    tracing::info!(template_id = %id, "Workflow template updated");
    Ok(template)
}

/// Delete a template.
///
/// Without `force`, refuses while any `active`/`waiting` workflow references
/// it. With `force`, deletes regardless and leaves those workflows in place.
pub async fn delete(conn: &mut PgConnection, id: DbId, force: bool) -> AppResult<()> {
    get(conn, id).await?;

    let open = WorkflowRepo::count_open_for_template(conn, id).await?;
    if open > 0 && !force {
        return Err(Rejection::conflict(
            "Template in use",
            format!(
                "Cannot delete template with {open} active workflow(s). \
                 Use force=true to delete anyway."
            ),
        )
        .with("template_id", id)
        .with("active_workflows_count", open)
        .into());
    }

    WorkflowTemplateRepo::delete(conn, id).await?;
    tracing::info!(template_id = %id, force, open_workflows = open, "Workflow template deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Bulk registration
// ---------------------------------------------------------------------------

/// Counts reported by bulk registration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Successful bulk registration result.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub created: Vec<WorkflowTemplate>,
    pub summary: BulkSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

/// Register several templates in one transaction.
///
/// A duplicate name aborts with 409 unless `skip_duplicates`, in which case it
/// is recorded and skipped. Validation failures are collected per index; any
/// failure without `skip_duplicates` aborts with 400. Nothing created is also
/// a 400.
pub async fn bulk_register(
    conn: &mut PgConnection,
    inputs: &[CreateWorkflowTemplate],
    skip_duplicates: bool,
) -> AppResult<BulkOutcome> {
    let mut created = Vec::new();
    let mut skipped = Vec::new();
    let mut errors = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        if let Err(e) = validate_new(input) {
            let message = match e {
                CoreError::Validation(msg) => msg,
                other => other.to_string(),
            };
            errors.push(json!({"index": index, "name": input.name, "error": message}));
            continue;
        }

        if let Some(existing) = WorkflowTemplateRepo::find_by_name(conn, &input.name).await? {
            if !skip_duplicates {
                return Err(duplicate_name(&input.name, existing.id)
                    .with("index", index)
                    .into());
            }
            skipped.push(json!({
                "index": index,
                "name": input.name,
                "existing_template_id": existing.id,
            }));
            continue;
        }

        created.push(WorkflowTemplateRepo::create(conn, input).await?);
    }

    let summary = BulkSummary {
        total: inputs.len(),
        created: created.len(),
        skipped: skipped.len(),
        errors: errors.len(),
    };

    if !errors.is_empty() && !skip_duplicates {
        return Err(Rejection::bad_request(
            "Bulk creation failed",
            format!("{} template(s) failed validation", errors.len()),
        )
        .with("errors", &errors)
        .with("summary", summary)
        .into());
    }

    if created.is_empty() {
        return Err(Rejection::bad_request(
            "No templates created",
            "None of the submitted templates were created",
        )
        .with("summary", summary)
        .with("skipped", &skipped)
        .with("errors", &errors)
        .into());
    }

    tracing::info!(
        total = summary.total,
        created = summary.created,
        skipped = summary.skipped,
        errors = summary.errors,
        "Bulk template registration finished"
    );

    Ok(BulkOutcome {
        created,
        summary,
        skipped,
        errors,
    })
}
