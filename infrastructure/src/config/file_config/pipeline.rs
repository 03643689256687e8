//! Pipeline configuration from TOML (`[pipeline]` section)

use super::issue::ConfigIssue;
use council_domain::{RequestDefaults, SelectionPolicy};
use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// [pipeline]
/// per_call_timeout_secs = 60
/// stage_deadline_secs = 120
/// top_k = 3
/// default_policy = "premium"
/// default_pattern = "comparative"
/// default_output_format = "markdown"
/// event_retention_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub per_call_timeout_secs: u64,
    pub stage_deadline_secs: u64,
    /// How many models the automatic policies keep
    pub top_k: usize,
    pub default_policy: SelectionPolicy,
    pub default_pattern: String,
    pub default_output_format: String,
    /// How long finished runs stay available for event replay
    pub event_retention_secs: u64,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let defaults = RequestDefaults::default();
        Self {
            per_call_timeout_secs: 60,
            stage_deadline_secs: 120,
            top_k: 3,
            default_policy: defaults.policy,
            default_pattern: defaults.pattern,
            default_output_format: defaults.output_format,
            event_retention_secs: 300,
        }
    }
}

impl FilePipelineConfig {
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            policy: self.default_policy,
            pattern: self.default_pattern.clone(),
            output_format: self.default_output_format.clone(),
        }
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.per_call_timeout_secs == 0 {
            issues.push(ConfigIssue::out_of_range(
                "pipeline.per_call_timeout_secs",
                "pipeline.per_call_timeout_secs must be at least 1",
            ));
        }
        if self.stage_deadline_secs == 0 {
            issues.push(ConfigIssue::out_of_range(
                "pipeline.stage_deadline_secs",
                "pipeline.stage_deadline_secs must be at least 1",
            ));
        }
        if self.top_k < 2 {
            issues.push(ConfigIssue::out_of_range(
                "pipeline.top_k",
                format!(
                    "pipeline.top_k is {}, but a run needs at least 2 models",
                    self.top_k
                ),
            ));
        }
        if self.default_policy == SelectionPolicy::Manual {
            issues.push(ConfigIssue::warning(
                super::issue::ConfigIssueCode::OutOfRange {
                    field: "pipeline.default_policy".to_string(),
                },
                "pipeline.default_policy = \"manual\" rejects every request that names no models",
            ));
        }
        issues
    }
}
