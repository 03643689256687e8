//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Resolve an API key: an inline key wins over the environment variable.
fn resolve_key(inline: Option<&str>, env_name: Option<&str>) -> Option<String> {
    inline
        .map(str::to_string)
        .or_else(|| env_name.and_then(|name| std::env::var(name).ok()))
        .filter(|key| !key.trim().is_empty())
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key (prefer the environment variable)
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    /// Value of the `anthropic-version` header
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl FileAnthropicConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), Some(&self.api_key_env))
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key (prefer the environment variable)
    pub api_key: Option<String>,
    /// Base URL including the version segment (Azure and proxies override it)
    pub base_url: String,
    pub max_tokens: Option<u32>,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: None,
        }
    }
}

impl FileOpenAiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), Some(&self.api_key_env))
    }
}

/// Extra OpenAI-compatible endpoint (OpenRouter, a local server, ...).
///
/// ```toml
/// [providers.compatible.openrouter]
/// base_url = "https://openrouter.ai/api/v1"
/// api_key_env = "OPENROUTER_API_KEY"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCompatibleConfig {
    pub base_url: String,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
}

impl FileCompatibleConfig {
    /// Keyless endpoints are allowed (local servers).
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// HTTP timeout applied by every provider client
    pub request_timeout_secs: u64,
    pub openai: FileOpenAiConfig,
    pub anthropic: FileAnthropicConfig,
    /// Named OpenAI-compatible endpoints
    pub compatible: BTreeMap<String, FileCompatibleConfig>,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            openai: FileOpenAiConfig::default(),
            anthropic: FileAnthropicConfig::default(),
            compatible: BTreeMap::new(),
        }
    }
}

impl FileProvidersConfig {
    /// Every provider name a model entry may refer to
    pub fn known_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = ["openai", "anthropic"]
            .into_iter()
            .map(str::to_string)
            .collect();
        names.extend(self.compatible.keys().map(|k| k.trim().to_lowercase()));
        names
    }
}
