//! Model backend port
//!
//! Defines how the application layer talks to language-model providers.
//! Adapters live in the infrastructure layer.

use async_trait::async_trait;
use council_domain::{ModelDescriptor, StagePrompt};
use thiserror::Error;

/// Errors a backend call can end with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Timeout")]
    Timeout,

    #[error("Provider not configured: {0}")]
    UnknownProvider(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Gateway to the models in the registry
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one prompt to one model and return its text reply.
    async fn invoke(
        &self,
        model: &ModelDescriptor,
        prompt: &StagePrompt,
    ) -> Result<String, BackendError>;

    /// Cheap liveness check used by registry refreshes.
    async fn probe(&self, model: &ModelDescriptor) -> Result<(), BackendError>;
}
