//! Request fingerprints

use crate::pipeline::request::PipelineRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 (lowercase hex) over the parts of a request that determine its
/// outcome.
///
/// Covered: the whitespace-normalized prompt, the requested model ids
/// (sorted and deduplicated, or `auto:<policy>` when none were given), the
/// pattern and the output format. The correlation id and ultra override are
/// not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &PipelineRequest) -> Self {
        let models = if request.requested_models().is_empty() {
            format!("auto:{}", request.policy().as_str())
        } else {
            let mut ids: Vec<&str> = request
                .requested_models()
                .iter()
                .map(|m| m.as_str())
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids.join(",")
        };

        let mut hasher = Sha256::new();
        for part in [
            request.prompt().normalized().as_str(),
            models.as_str(),
            request.pattern(),
            request.output_format(),
        ] {
            hasher.update(part.as_bytes());
            // separator byte so field boundaries cannot shift
            hasher.update([0u8]);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::request::{RequestDefaults, RequestPayload};

    fn fp(payload: RequestPayload) -> Fingerprint {
        let request = PipelineRequest::from_payload(payload, &RequestDefaults::default()).unwrap();
        Fingerprint::of(&request)
    }

    #[test]
    fn test_hex_sha256() {
        let f = fp(RequestPayload::new("hello"));
        assert_eq!(f.as_str().len(), 64);
        assert!(f.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_whitespace_and_model_order_ignored() {
        let a = fp(RequestPayload::new("What is  Rust?").with_models(["b", "a"]));
        let b = fp(RequestPayload::new("  What is\nRust? ").with_models(["a", "b", "a"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_correlation_id_ignored() {
        let a = fp(RequestPayload::new("q").with_correlation_id("one"));
        let b = fp(RequestPayload::new("q").with_correlation_id("two"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinguishing_fields() {
        let base = fp(RequestPayload::new("q"));
        assert_ne!(base, fp(RequestPayload::new("q2")));
        assert_ne!(base, fp(RequestPayload::new("q").with_pattern("debate")));
        assert_ne!(base, fp(RequestPayload::new("q").with_output_format("json")));
        assert_ne!(base, fp(RequestPayload::new("q").with_policy("budget")));
        assert_ne!(base, fp(RequestPayload::new("q").with_models(["a", "b"])));
    }
}
