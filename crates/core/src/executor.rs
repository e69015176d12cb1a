//! External executor seam for API-kind dependencies and end actions.
//!
//! The service itself performs no outbound HTTP. Deployments that verify
//! external dependencies or fire end actions plug in their own
//! [`ApiExecutor`]; [`DeferredExecutor`] is the default.

use async_trait::async_trait;
use serde_json::Value;

use crate::dependency::ApiConfig;
use crate::error::CoreError;
use crate::template::EndAction;

#[async_trait]
pub trait ApiExecutor: Send + Sync {
    /// Whether the external dependency described by `config` is satisfied.
    async fn check(&self, config: &ApiConfig) -> Result<bool, CoreError>;

    /// Fire an end action. `Ok(None)` means nothing to record.
    async fn invoke(&self, action: &EndAction) -> Result<Option<Value>, CoreError>;
}

/// Treats every API dependency as satisfied and defers every end action.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredExecutor;

#[async_trait]
impl ApiExecutor for DeferredExecutor {
    async fn check(&self, _config: &ApiConfig) -> Result<bool, CoreError> {
        Ok(true)
    }

    async fn invoke(&self, _action: &EndAction) -> Result<Option<Value>, CoreError> {
        Ok(None)
    }
}
