//! Configuration issues reported by [`FileConfig::validate`](super::FileConfig::validate)

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration cannot work as written.
    Error,
    /// The configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A `[[models]]` entry has an empty or invalid id.
    InvalidModelId { value: String },
    /// Two `[[models]]` entries share an id.
    DuplicateModel { id: String },
    /// A model names a provider with no `[providers]` entry.
    UnknownProvider { model: String, provider: String },
    /// A numeric setting is outside its usable range.
    OutOfRange { field: String },
    /// No models are configured at all.
    NoModels,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub(crate) fn out_of_range(field: &str, message: impl Into<String>) -> Self {
        Self::error(
            ConfigIssueCode::OutOfRange {
                field: field.to_string(),
            },
            message,
        )
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
