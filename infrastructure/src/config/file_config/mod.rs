//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. They deserialize with
//! defaults for every missing field and convert into the application and
//! domain types the pipeline runs on.

mod cache;
mod circuit_breaker;
mod issue;
mod models;
mod pipeline;
mod providers;
mod registry;

pub use cache::FileCacheConfig;
pub use circuit_breaker::FileCircuitBreakerConfig;
pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use models::{FileModelEntry, parse_models};
pub use pipeline::FilePipelineConfig;
pub use providers::{
    FileAnthropicConfig, FileCompatibleConfig, FileOpenAiConfig, FileProvidersConfig,
};
pub use registry::FileRegistryConfig;

use council_application::PipelineSettings;
use council_domain::{AggregationParams, BreakerPolicy, ModelDescriptor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub pipeline: FilePipelineConfig,
    pub circuit_breaker: FileCircuitBreakerConfig,
    pub cache: FileCacheConfig,
    /// Suggestion clustering parameters
    pub aggregation: AggregationParams,
    pub registry: FileRegistryConfig,
    pub models: Vec<FileModelEntry>,
    pub providers: FileProvidersConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.pipeline.validate());
        issues.extend(self.circuit_breaker.validate());
        issues.extend(self.validate_aggregation());

        let (descriptors, model_issues) = parse_models(&self.models);
        issues.extend(model_issues);

        if self.models.is_empty() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoModels,
                "no [[models]] configured; every run will fail selection",
            ));
        }

        let known = self.providers.known_names();
        for descriptor in &descriptors {
            if !known.contains(&descriptor.provider) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownProvider {
                        model: descriptor.id.to_string(),
                        provider: descriptor.provider.clone(),
                    },
                    format!(
                        "models: '{}' uses provider '{}', which has no [providers] entry",
                        descriptor.id, descriptor.provider
                    ),
                ));
            }
        }

        issues
    }

    fn validate_aggregation(&self) -> Vec<ConfigIssue> {
        let params = &self.aggregation;
        let mut issues = Vec::new();
        if !(0.0..=1.0).contains(&params.similarity_threshold) {
            issues.push(ConfigIssue::out_of_range(
                "aggregation.similarity_threshold",
                format!(
                    "aggregation.similarity_threshold is {}, expected a value in [0, 1]",
                    params.similarity_threshold
                ),
            ));
        }
        if params.source_saturation == 0 {
            issues.push(ConfigIssue::out_of_range(
                "aggregation.source_saturation",
                "aggregation.source_saturation must be at least 1",
            ));
        }
        issues
    }

    /// Registered models, leaving out entries `validate` reports
    pub fn model_descriptors(&self) -> Vec<ModelDescriptor> {
        parse_models(&self.models).0
    }

    pub fn breaker_policy(&self) -> BreakerPolicy {
        self.circuit_breaker.policy()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::default()
            .with_per_call_timeout(Duration::from_secs(self.pipeline.per_call_timeout_secs))
            .with_stage_deadline(Duration::from_secs(self.pipeline.stage_deadline_secs))
            .with_top_k(self.pipeline.top_k)
            .with_defaults(self.pipeline.request_defaults())
            .with_cache(self.cache.enabled, Duration::from_secs(self.cache.ttl_secs))
            .with_aggregation(self.aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::SelectionPolicy;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[pipeline]
per_call_timeout_secs = 30
stage_deadline_secs = 90
top_k = 4
default_policy = "speed"
default_pattern = "critical"

[circuit_breaker]
failure_threshold = 5
cooldown_secs = 10

[cache]
enabled = false

[aggregation]
similarity_threshold = 0.7

[[models]]
id = "gpt-4o"
provider = "openai"
cost_per_1k_tokens = 5.0
capabilities = ["premium"]

[[models]]
id = "mistral"
provider = "openrouter"
upstream = "mistralai/mistral-large"

[providers.compatible.openrouter]
base_url = "https://openrouter.ai/api/v1"
api_key_env = "OPENROUTER_API_KEY"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline.top_k, 4);
        assert_eq!(config.pipeline.default_policy, SelectionPolicy::Speed);
        assert_eq!(config.pipeline.default_output_format, "markdown");
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.aggregation.similarity_threshold, 0.7);
        assert_eq!(config.aggregation.source_saturation, 5);
        assert_eq!(config.models.len(), 2);
        assert!(config.validate().is_empty());

        let settings = config.pipeline_settings();
        assert_eq!(settings.per_call_timeout, Duration::from_secs(30));
        assert_eq!(settings.stage_deadline, Duration::from_secs(90));
        assert_eq!(settings.defaults.pattern, "critical");
        assert!(!settings.cache_enabled);

        let policy = config.breaker_policy();
        assert_eq!(policy.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_only_warns_about_missing_models() {
        let config = FileConfig::default();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::NoModels);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_validate_reports_unknown_provider_and_ranges() {
        let toml_str = r#"
[pipeline]
top_k = 1

[circuit_breaker]
failure_threshold = 0

[aggregation]
similarity_threshold = 1.5

[[models]]
id = "x"
provider = "nowhere"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
        assert_eq!(errors.len(), 4);
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::UnknownProvider { provider, .. } if provider == "nowhere"
        )));
    }
}
