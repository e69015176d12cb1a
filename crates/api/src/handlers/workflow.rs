//! Handlers for the `/api/workflows` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use flowreg_core::search::ilike_pattern;
use flowreg_core::types::DbId;
use flowreg_db::models::workflow::{CreateWorkflow, UpdateWorkflow, WorkflowFilter};

use crate::engine::lifecycle::{self, UpdateOutcome};
use crate::error::{AppResult, Rejection};
use crate::query::{resolve_page, WorkflowListParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/workflows
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateWorkflow>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let workflow = lifecycle::create_workflow(&mut *tx, state.executor.as_ref(), &input).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: workflow })))
}

/// GET /api/workflows
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<WorkflowListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let filter = WorkflowFilter {
        conversation_id: params.conversation_id,
        user_id: params.user_id,
        template_id: params.template_id,
        status: params.status,
        search_pattern: ilike_pattern(params.search.as_deref()),
    };

    let mut conn = state.pool.acquire().await?;
    let workflows = lifecycle::list(&mut *conn, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: workflows }))
}

/// GET /api/workflows/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let workflow = lifecycle::get(&mut *conn, id).await?;
    Ok(Json(DataResponse { data: workflow }))
}

/// PUT /api/workflows/{id}
///
/// A refused activation still commits the move to `waiting`, then answers
/// 400 with the dependency detail.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkflow>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let outcome = lifecycle::update_workflow(&mut *tx, state.executor.as_ref(), id, &input).await?;
    tx.commit().await?;

    match outcome {
        UpdateOutcome::Updated(workflow) => Ok(Json(DataResponse { data: workflow })),
        UpdateOutcome::Blocked { workflow, decision } => Err(Rejection::bad_request(
            "Dependencies not satisfied",
            "Workflow cannot be activated until its dependencies are satisfied",
        )
        .with("workflow_id", workflow.id)
        .with("status", &workflow.status)
        .with("reason", decision.reason)
        .with("pending_dependencies", &decision.workflow_dependencies)
        .into()),
    }
}

/// DELETE /api/workflows/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await?;
    lifecycle::delete_workflow(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/workflows/{id}/dependencies
pub async fn dependencies(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let status = lifecycle::dependency_status(&mut *conn, state.executor.as_ref(), id).await?;
    Ok(Json(DataResponse { data: status }))
}
