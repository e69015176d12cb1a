use std::sync::Arc;

use flowreg_core::executor::ApiExecutor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: flowreg_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Checks API-kind dependencies and fires end actions.
    pub executor: Arc<dyn ApiExecutor>,
}
