//! Route definitions for user-type permissions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::permission;
use crate::state::AppState;

/// Routes mounted at `/permissions`.
///
/// ```text
/// POST   /                                  -> grant
/// DELETE /?user_type_id=&workflow_template_id= -> revoke
/// GET    /user-type/{user_type_id}          -> list_for_user_type
/// GET    /workflow-template/{template_id}   -> list_for_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(permission::grant).delete(permission::revoke))
        .route(
            "/user-type/{user_type_id}",
            get(permission::list_for_user_type),
        )
        .route(
            "/workflow-template/{template_id}",
            get(permission::list_for_template),
        )
}
