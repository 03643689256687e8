//! Build the routing backend from `[providers]` configuration

use super::{AnthropicAdapter, OpenAiCompatibleAdapter, ProviderAdapter, RoutingBackend};
use crate::config::{ConfigError, FileProvidersConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Create one adapter per usable provider entry.
///
/// OpenAI and Anthropic are skipped with a warning when no API key
/// resolves; their models then fail with an unknown-provider error.
/// Compatible endpoints may run without a key but need a base URL.
pub fn build_backend(config: &FileProvidersConfig) -> Result<RoutingBackend, ConfigError> {
    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
    let mut backend = RoutingBackend::new();

    match config.openai.resolve_api_key() {
        Some(key) => {
            let adapter = OpenAiCompatibleAdapter::new(
                "openai",
                config.openai.base_url.as_str(),
                Some(&key),
                config.openai.max_tokens,
                timeout,
            )
            .map_err(|source| ConfigError::Provider {
                provider: "openai".to_string(),
                source,
            })?;
            backend = backend.with_provider(Arc::new(adapter) as Arc<dyn ProviderAdapter>);
        }
        None => warn!(
            "OpenAI provider disabled: {} is not set",
            config.openai.api_key_env
        ),
    }

    match config.anthropic.resolve_api_key() {
        Some(key) => {
            let adapter = AnthropicAdapter::new(
                config.anthropic.base_url.as_str(),
                &key,
                &config.anthropic.api_version,
                config.anthropic.max_tokens,
                timeout,
            )
            .map_err(|source| ConfigError::Provider {
                provider: "anthropic".to_string(),
                source,
            })?;
            backend = backend.with_provider(Arc::new(adapter) as Arc<dyn ProviderAdapter>);
        }
        None => warn!(
            "Anthropic provider disabled: {} is not set",
            config.anthropic.api_key_env
        ),
    }

    for (name, endpoint) in &config.compatible {
        let name = name.trim().to_lowercase();
        if endpoint.base_url.trim().is_empty() {
            warn!("Compatible provider '{}' skipped: base_url is empty", name);
            continue;
        }
        let key = endpoint.resolve_api_key();
        let adapter = OpenAiCompatibleAdapter::new(
            name.as_str(),
            endpoint.base_url.as_str(),
            key.as_deref(),
            endpoint.max_tokens,
            timeout,
        )
        .map_err(|source| ConfigError::Provider {
            provider: name.clone(),
            source,
        })?;
        backend = backend.with_provider(Arc::new(adapter) as Arc<dyn ProviderAdapter>);
    }

    debug!("Configured providers: {:?}", backend.provider_names());
    Ok(backend)
}
