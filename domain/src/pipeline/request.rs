//! Pipeline request: wire payload and validated request

use crate::core::error::DomainError;
use crate::core::model::ModelId;
use crate::core::prompt::Prompt;
use crate::selection::policy::SelectionPolicy;
use serde::{Deserialize, Serialize};

const MAX_LABEL_CHARS: usize = 64;
const MAX_CORRELATION_ID_CHARS: usize = 128;

/// Request as submitted by a collaborator (JSON shape)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPayload {
    pub prompt: String,
    #[serde(default)]
    pub selected_models: Option<Vec<String>>,
    #[serde(default)]
    pub selection_policy: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub ultra_model: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl RequestPayload {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.selection_policy = Some(policy.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_ultra_model(mut self, model: impl Into<String>) -> Self {
        self.ultra_model = Some(model.into());
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Values applied when the payload leaves a field out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub policy: SelectionPolicy,
    pub pattern: String,
    pub output_format: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Premium,
            pattern: "comparative".to_string(),
            output_format: "markdown".to_string(),
        }
    }
}

/// Fresh UUID v4 correlation id
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validated pipeline request (immutable once accepted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRequest {
    correlation_id: String,
    prompt: Prompt,
    requested_models: Vec<ModelId>,
    policy: SelectionPolicy,
    pattern: String,
    ultra_model: Option<ModelId>,
    output_format: String,
}

impl PipelineRequest {
    /// Validate a payload, filling omitted fields from `defaults`.
    ///
    /// A missing or blank correlation id is replaced by a fresh UUID v4.
    pub fn from_payload(
        payload: RequestPayload,
        defaults: &RequestDefaults,
    ) -> Result<Self, DomainError> {
        let prompt = Prompt::new(payload.prompt)?;

        let mut requested_models: Vec<ModelId> = Vec::new();
        for raw in payload.selected_models.unwrap_or_default() {
            let id = ModelId::new(raw)?;
            if !requested_models.contains(&id) {
                requested_models.push(id);
            }
        }

        let policy = match payload.selection_policy.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<SelectionPolicy>()
                .map_err(DomainError::InvalidRequest)?,
            _ => {
                // An explicit list with no policy means the caller picked by hand.
                if requested_models.is_empty() {
                    defaults.policy
                } else {
                    SelectionPolicy::Manual
                }
            }
        };
        if policy == SelectionPolicy::Manual && requested_models.is_empty() {
            return Err(DomainError::InvalidRequest(
                "manual selection requires selected_models".to_string(),
            ));
        }

        let pattern = label("pattern", payload.pattern, &defaults.pattern)?;
        let output_format = label(
            "output_format",
            payload.output_format,
            &defaults.output_format,
        )?;

        let ultra_model = match payload.ultra_model {
            Some(raw) if !raw.trim().is_empty() => Some(ModelId::new(raw)?),
            _ => None,
        };

        let correlation_id = match payload.correlation_id {
            Some(raw) if !raw.trim().is_empty() => {
                let trimmed = raw.trim();
                if trimmed.chars().count() > MAX_CORRELATION_ID_CHARS {
                    return Err(DomainError::InvalidRequest(format!(
                        "correlation_id longer than {} characters",
                        MAX_CORRELATION_ID_CHARS
                    )));
                }
                trimmed.to_string()
            }
            _ => generate_correlation_id(),
        };

        Ok(Self {
            correlation_id,
            prompt,
            requested_models,
            policy,
            pattern,
            ultra_model,
            output_format,
        })
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Requested models; empty means automatic selection
    pub fn requested_models(&self) -> &[ModelId] {
        &self.requested_models
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn ultra_model(&self) -> Option<&ModelId> {
        self.ultra_model.as_ref()
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }
}

/// Validate a short identifier-like field (pattern, output format).
fn label(field: &str, value: Option<String>, default: &str) -> Result<String, DomainError> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_lowercase(),
        _ => return Ok(default.to_string()),
    };
    if value.chars().count() > MAX_LABEL_CHARS {
        return Err(DomainError::InvalidRequest(format!(
            "{} longer than {} characters",
            field, MAX_LABEL_CHARS
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::InvalidRequest(format!(
            "{} may only contain letters, digits, '-' and '_': {}",
            field, value
        )));
    }
    Ok(value)
}
