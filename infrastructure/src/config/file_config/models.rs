//! Model catalogue from TOML (`[[models]]` array)

use super::issue::{ConfigIssue, ConfigIssueCode};
use council_domain::{ModelDescriptor, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One registered model
///
/// # Example
///
/// ```toml
/// [[models]]
/// id = "gpt-4o"
/// provider = "openai"
/// cost_per_1k_tokens = 5.0
/// capabilities = ["premium"]
///
/// [[models]]
/// id = "haiku"
/// provider = "anthropic"
/// cost_per_1k_tokens = 0.25
/// capabilities = ["low-latency"]
/// upstream = "claude-3-5-haiku-latest"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModelEntry {
    pub id: String,
    pub provider: String,
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Provider-side model name when it differs from `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

/// Convert entries into descriptors, collecting issues for the ones skipped.
///
/// Invalid ids and duplicates are reported and left out; the first entry
/// with a given id wins.
pub fn parse_models(entries: &[FileModelEntry]) -> (Vec<ModelDescriptor>, Vec<ConfigIssue>) {
    let mut descriptors = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        let id = match ModelId::new(entry.id.as_str()) {
            Ok(id) => id,
            Err(e) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidModelId {
                        value: entry.id.clone(),
                    },
                    format!("models: invalid id '{}': {}", entry.id, e),
                ));
                continue;
            }
        };

        if !seen.insert(id.clone()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::DuplicateModel {
                    id: id.to_string(),
                },
                format!("models: '{}' is listed more than once, keeping the first", id),
            ));
            continue;
        }

        if !entry.cost_per_1k_tokens.is_finite() || entry.cost_per_1k_tokens < 0.0 {
            issues.push(ConfigIssue::out_of_range(
                "models.cost_per_1k_tokens",
                format!("models: '{}' has a negative or non-finite cost", id),
            ));
            continue;
        }

        let mut descriptor = ModelDescriptor::new(
            id,
            entry.provider.trim().to_lowercase(),
            entry.cost_per_1k_tokens,
        );
        for tag in &entry.capabilities {
            descriptor = descriptor.with_capability(tag.as_str());
        }
        if let Some(upstream) = entry.upstream.as_deref().filter(|u| !u.trim().is_empty()) {
            descriptor = descriptor.with_upstream_name(upstream);
        }
        descriptors.push(descriptor);
    }

    (descriptors, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, provider: &str, cost: f64) -> FileModelEntry {
        FileModelEntry {
            id: id.to_string(),
            provider: provider.to_string(),
            cost_per_1k_tokens: cost,
            capabilities: Vec::new(),
            upstream: None,
        }
    }

    #[test]
    fn test_parse_models_builds_descriptors() {
        let mut haiku = entry("haiku", "Anthropic", 0.25);
        haiku.capabilities = vec!["low-latency".to_string()];
        haiku.upstream = Some("claude-3-5-haiku-latest".to_string());

        let (models, issues) = parse_models(&[entry("gpt-4o", "openai", 5.0), haiku]);
        assert!(issues.is_empty());
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].provider, "anthropic");
        assert_eq!(models[1].upstream(), "claude-3-5-haiku-latest");
        assert!(models[1].has_capability("low-latency"));
    }

    #[test]
    fn test_parse_models_reports_bad_entries() {
        let (models, issues) = parse_models(&[
            entry("a", "openai", 1.0),
            entry("a", "openai", 2.0),
            entry("  ", "openai", 1.0),
            entry("b", "openai", -1.0),
        ]);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].cost_per_1k_tokens, 1.0);
        assert_eq!(issues.len(), 3);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::DuplicateModel { .. }
        ));
        assert!(matches!(
            issues[1].code,
            ConfigIssueCode::InvalidModelId { .. }
        ));
        assert!(issues[2].is_error());
    }
}
