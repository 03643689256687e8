//! Provider adapters
//!
//! Each adapter speaks one HTTP API. The [`RoutingBackend`] implements the
//! application's `ModelBackend` port by dispatching on a descriptor's
//! provider name.

pub mod anthropic;
pub mod factory;
pub mod http;
pub mod openai;
pub mod routing;

use async_trait::async_trait;
use council_application::ports::model_backend::BackendError;
use council_domain::StagePrompt;

pub use anthropic::AnthropicAdapter;
pub use factory::build_backend;
pub use openai::OpenAiCompatibleAdapter;
pub use routing::RoutingBackend;

/// One configured provider endpoint
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name model descriptors refer to (`openai`, `anthropic`, ...)
    fn name(&self) -> &str;

    /// Run one chat completion against `model` (the provider's model name).
    async fn complete(&self, model: &str, prompt: &StagePrompt) -> Result<String, BackendError>;

    /// Model names the endpoint currently offers.
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;
}
