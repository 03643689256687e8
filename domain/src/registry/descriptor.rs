//! Model descriptors and health status

use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};

/// Capability tag marking a model as part of the premium tier.
pub const CAPABILITY_PREMIUM: &str = "premium";

/// Capability tag marking a model as low latency.
pub const CAPABILITY_LOW_LATENCY: &str = "low-latency";

/// Health of a registered model as observed by the last probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Registered but not probed yet
    #[default]
    Checking,
    /// Last probe succeeded
    Ready,
    /// Last probe failed
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Checking => "checking",
            HealthStatus::Ready => "ready",
            HealthStatus::Error => "error",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, HealthStatus::Ready)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a usable model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Registry identifier
    pub id: ModelId,
    /// Provider name used to route calls (e.g. "openai", "anthropic")
    pub provider: String,
    /// Cost in USD per 1000 tokens
    pub cost_per_1k_tokens: f64,
    /// Capability tags (e.g. "premium", "low-latency")
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Model name on the provider side, when it differs from `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_name: Option<String>,
    /// Health as of the last probe
    #[serde(default)]
    pub health: HealthStatus,
}

impl ModelDescriptor {
    pub fn new(id: ModelId, provider: impl Into<String>, cost_per_1k_tokens: f64) -> Self {
        Self {
            id,
            provider: provider.into(),
            cost_per_1k_tokens,
            capabilities: Vec::new(),
            upstream_name: None,
            health: HealthStatus::Checking,
        }
    }

    pub fn with_capability(mut self, tag: impl Into<String>) -> Self {
        self.capabilities.push(tag.into());
        self
    }

    pub fn with_upstream_name(mut self, name: impl Into<String>) -> Self {
        self.upstream_name = Some(name.into());
        self
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    /// Name to send to the provider API
    pub fn upstream(&self) -> &str {
        self.upstream_name.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(tag))
    }
}
