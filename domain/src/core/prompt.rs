//! Prompt value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Upper bound on prompt size accepted by the pipeline (characters).
pub const MAX_PROMPT_CHARS: usize = 100_000;

/// A prompt to be answered by the council (Value Object)
///
/// Represents the input that is sent to every selected model in the
/// initial stage and threaded through the later stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prompt {
    content: String,
}

impl Prompt {
    /// Create a new prompt, rejecting blank or oversized content
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidPrompt(
                "prompt cannot be empty".to_string(),
            ));
        }
        let chars = content.chars().count();
        if chars > MAX_PROMPT_CHARS {
            return Err(DomainError::InvalidPrompt(format!(
                "prompt is {} characters, limit is {}",
                chars, MAX_PROMPT_CHARS
            )));
        }
        Ok(Self { content })
    }

    /// Get the prompt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whitespace-collapsed, trimmed form used for fingerprinting
    pub fn normalized(&self) -> String {
        self.content.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}

impl TryFrom<String> for Prompt {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prompt::new(value)
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.content
    }
}
