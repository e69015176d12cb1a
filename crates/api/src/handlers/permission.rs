//! Handlers for the `/api/permissions` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use flowreg_core::types::DbId;
use flowreg_db::models::permission::CreateUserTypeWorkflowTemplate;

use crate::engine::permissions;
use crate::error::AppResult;
use crate::query::{ActiveFilterParams, PermissionPairParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/permissions
///
/// 201 when the grant is new, 200 when it already existed.
pub async fn grant(
    State(state): State<AppState>,
    Json(input): Json<CreateUserTypeWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;
    let grant = permissions::grant(&mut *tx, &input).await?;
    tx.commit().await?;

    let status = if grant.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: grant.permission })))
}

/// DELETE /api/permissions?user_type_id=&workflow_template_id=
pub async fn revoke(
    State(state): State<AppState>,
    Query(params): Query<PermissionPairParams>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await?;
    permissions::revoke(&mut *tx, params.user_type_id, params.workflow_template_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/permissions/user-type/{user_type_id}?is_active=
pub async fn list_for_user_type(
    State(state): State<AppState>,
    Path(user_type_id): Path<DbId>,
    Query(params): Query<ActiveFilterParams>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let grants =
        permissions::list_for_user_type(&mut *conn, user_type_id, params.is_active).await?;
    Ok(Json(DataResponse { data: grants }))
}

/// GET /api/permissions/workflow-template/{template_id}
pub async fn list_for_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let grants = permissions::list_for_template(&mut *conn, template_id).await?;
    Ok(Json(DataResponse { data: grants }))
}
