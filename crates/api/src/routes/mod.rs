pub mod health;
pub mod permissions;
pub mod workflow_templates;
pub mod workflows;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /workflow-templates                               list, create
/// /workflow-templates/bulk                          bulk create (POST)
/// /workflow-templates/name/{name}                   get by name
/// /workflow-templates/user-type/{user_type_id}      templates available to a user type
/// /workflow-templates/{id}                          get, update, delete (?force)
///
/// /permissions                                      grant (POST), revoke (DELETE)
/// /permissions/user-type/{user_type_id}             grants for a user type
/// /permissions/workflow-template/{template_id}      grants for a template
///
/// /workflows                                        list, create
/// /workflows/{id}                                   get, update, delete
/// /workflows/{id}/dependencies                      dependency check
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/workflow-templates", workflow_templates::router())
        .nest("/permissions", permissions::router())
        .nest("/workflows", workflows::router())
}
