//! Model identifier value object

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a model backend (Value Object)
///
/// Registry ids are free-form (`"gpt-4o"`, `"claude-sonnet-4.5"`,
/// `"openrouter/mistral-large"`), trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    /// Create a model id, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidModelId(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ModelId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::new(s)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ModelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ModelId::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_trims() {
        let id = ModelId::new("  gpt-4o ").unwrap();
        assert_eq!(id.as_str(), "gpt-4o");
        assert_eq!(id.to_string(), "gpt-4o");
    }

    #[test]
    fn test_blank_model_id_rejected() {
        assert!(ModelId::new("").is_err());
        assert!("   ".parse::<ModelId>().is_err());
    }

    #[test]
    fn test_model_id_serde() {
        let id: ModelId = serde_json::from_str("\"claude-sonnet-4.5\"").unwrap();
        assert_eq!(id.as_str(), "claude-sonnet-4.5");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"claude-sonnet-4.5\"");
        assert!(serde_json::from_str::<ModelId>("\"\"").is_err());
    }
}
