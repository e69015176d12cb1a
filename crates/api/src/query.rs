//! Shared query parameter types for API handlers.

use flowreg_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use flowreg_core::types::DbId;
use serde::Deserialize;

/// `(limit, offset)` clamped to valid bounds.
///
/// List params carry `limit`/`offset` inline: `#[serde(flatten)]` does not
/// parse numeric query values.
pub fn resolve_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
        clamp_offset(offset),
    )
}

/// Query parameters for `GET /api/workflow-templates`.
#[derive(Debug, Deserialize)]
pub struct TemplateListParams {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    /// `skip` is accepted as an alias.
    #[serde(alias = "skip")]
    pub offset: Option<i64>,
}

/// Query parameters for `GET /api/workflows`.
#[derive(Debug, Deserialize)]
pub struct WorkflowListParams {
    pub conversation_id: Option<DbId>,
    pub user_id: Option<String>,
    pub template_id: Option<DbId>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    /// `skip` is accepted as an alias.
    #[serde(alias = "skip")]
    pub offset: Option<i64>,
}

/// `?is_active=` filter.
#[derive(Debug, Deserialize)]
pub struct ActiveFilterParams {
    pub is_active: Option<bool>,
}

/// `?force=` flag for template deletion.
#[derive(Debug, Deserialize)]
pub struct ForceParams {
    #[serde(default)]
    pub force: bool,
}

/// `?skip_duplicates=` flag for bulk template creation.
#[derive(Debug, Deserialize)]
pub struct BulkCreateParams {
    #[serde(default)]
    pub skip_duplicates: bool,
}

/// Query parameters identifying a permission grant to revoke.
#[derive(Debug, Deserialize)]
pub struct PermissionPairParams {
    pub user_type_id: DbId,
    pub workflow_template_id: DbId,
}
