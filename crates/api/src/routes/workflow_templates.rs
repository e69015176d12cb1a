//! Route definitions for workflow templates.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workflow_template;
use crate::state::AppState;

/// Routes mounted at `/workflow-templates`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// POST   /bulk                      -> bulk_create
/// GET    /name/{name}               -> get_by_name
/// GET    /user-type/{user_type_id}  -> list_for_user_type
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(workflow_template::list).post(workflow_template::create),
        )
        .route("/bulk", post(workflow_template::bulk_create))
        .route("/name/{name}", get(workflow_template::get_by_name))
        .route(
            "/user-type/{user_type_id}",
            get(workflow_template::list_for_user_type),
        )
        .route(
            "/{id}",
            get(workflow_template::get_by_id)
                .put(workflow_template::update)
                .delete(workflow_template::delete),
        )
}
