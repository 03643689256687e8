//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Invalid model id: {0:?}")]
    InvalidModelId(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

impl DomainError {
    /// Stable machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::UnknownModel(_) => "UNKNOWN_MODEL",
            _ => "VALIDATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DomainError::InvalidPrompt("empty".to_string()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            DomainError::UnknownModel("x".to_string()).code(),
            "UNKNOWN_MODEL"
        );
    }

    #[test]
    fn test_error_display() {
        let error = DomainError::UnknownModel("gpt-9".to_string());
        assert_eq!(error.to_string(), "Unknown model: gpt-9");
    }
}
