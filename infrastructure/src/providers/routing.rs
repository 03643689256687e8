//! Provider routing
//!
//! Implements the `ModelBackend` port by handing each call to the adapter
//! named by the model descriptor's `provider`.

use super::ProviderAdapter;
use async_trait::async_trait;
use council_application::ports::model_backend::{BackendError, ModelBackend};
use council_domain::{ModelDescriptor, StagePrompt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct RoutingBackend {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl RoutingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn with_provider(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.insert(adapter.name().to_string(), adapter);
        self
    }

    /// Names of the configured providers, sorted
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn resolve(&self, model: &ModelDescriptor) -> Result<&dyn ProviderAdapter, BackendError> {
        self.providers
            .get(&model.provider)
            .map(|p| p.as_ref())
            .ok_or_else(|| BackendError::UnknownProvider(model.provider.clone()))
    }
}

#[async_trait]
impl ModelBackend for RoutingBackend {
    async fn invoke(
        &self,
        model: &ModelDescriptor,
        prompt: &StagePrompt,
    ) -> Result<String, BackendError> {
        self.resolve(model)?.complete(model.upstream(), prompt).await
    }

    /// A model is healthy when its provider answers the model listing and
    /// either lists the model or lists nothing at all.
    async fn probe(&self, model: &ModelDescriptor) -> Result<(), BackendError> {
        let offered = self.resolve(model)?.list_models().await?;
        debug!("{} offers {} models", model.provider, offered.len());
        if offered.is_empty() || offered.iter().any(|m| m == model.upstream()) {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "{} does not offer {}",
                model.provider,
                model.upstream()
            )))
        }
    }
}
