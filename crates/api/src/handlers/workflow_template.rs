//! Handlers for the `/api/workflow-templates` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use flowreg_core::search::ilike_pattern;
use flowreg_core::types::DbId;
use flowreg_db::models::workflow_template::{
    CreateWorkflowTemplate, TemplateFilter, UpdateWorkflowTemplate,
};

use crate::engine::{permissions, registry};
use crate::error::AppResult;
use crate::query::{
    resolve_page, ActiveFilterParams, BulkCreateParams, ForceParams, TemplateListParams,
};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/workflow-templates
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let template = registry::register(&mut *tx, &input).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// POST /api/workflow-templates/bulk?skip_duplicates=
pub async fn bulk_create(
    State(state): State<AppState>,
    Query(params): Query<BulkCreateParams>,
    Json(inputs): Json<Vec<CreateWorkflowTemplate>>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let outcome = registry::bulk_register(&mut *tx, &inputs, params.skip_duplicates).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/workflow-templates
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TemplateListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let filter = TemplateFilter {
        category: params.category,
        is_active: params.is_active,
        search_pattern: ilike_pattern(params.search.as_deref()),
    };

    let mut conn = state.pool.acquire().await?;
    let templates = registry::list(&mut *conn, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/workflow-templates/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let template = registry::get(&mut *conn, id).await?;
    Ok(Json(DataResponse { data: template }))
}

/// GET /api/workflow-templates/name/{name}
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let template = registry::get_by_name(&mut *conn, &name).await?;
    Ok(Json(DataResponse { data: template }))
}

/// GET /api/workflow-templates/user-type/{user_type_id}?is_active=
///
/// Active templates granted to the user type.
pub async fn list_for_user_type(
    State(state): State<AppState>,
    Path(user_type_id): Path<DbId>,
    Query(params): Query<ActiveFilterParams>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let templates =
        permissions::templates_for_user_type(&mut *conn, user_type_id, params.is_active).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// PUT /api/workflow-templates/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let template = registry::update(&mut *tx, id, &input).await?;
    tx.commit().await?;

    Ok(Json(DataResponse { data: template }))
}

/// DELETE /api/workflow-templates/{id}?force=
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ForceParams>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await?;
    registry::delete(&mut *tx, id, params.force).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
