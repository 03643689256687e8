//! HTTP plumbing shared by the adapters

use council_application::ports::model_backend::BackendError;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Largest response body an adapter accepts (1 MiB).
pub const MAX_RESPONSE_BYTES: usize = 1_024 * 1_024;

pub fn build_client(
    headers: HeaderMap,
    timeout: Duration,
) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| BackendError::RequestFailed(format!("failed to create HTTP client: {e}")))
}

/// Map a transport-level failure.
pub fn transport_error(provider: &str, e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unavailable(format!("{provider}: {e}"))
    } else {
        BackendError::RequestFailed(format!("{provider}: {e}"))
    }
}

/// Map a non-success HTTP status; rate limits and server errors count as
/// the provider being unavailable.
pub fn status_error(provider: &str, status: u16, message: &str) -> BackendError {
    let detail = if message.is_empty() {
        format!("{provider}: HTTP {status}")
    } else {
        format!("{provider}: HTTP {status}: {message}")
    };
    if status == 429 || status >= 500 {
        BackendError::Unavailable(detail)
    } else {
        BackendError::RequestFailed(detail)
    }
}

/// Read a response body, enforcing [`MAX_RESPONSE_BYTES`].
pub async fn read_body(
    provider: &str,
    mut response: reqwest::Response,
) -> Result<String, BackendError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(provider, e))?
    {
        if bytes.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(BackendError::InvalidResponse(format!(
                "{provider}: response larger than {MAX_RESPONSE_BYTES} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_classification() {
        assert!(matches!(status_error("openai", 429, ""), BackendError::Unavailable(_)));
        assert!(matches!(status_error("openai", 503, "busy"), BackendError::Unavailable(_)));
        assert_eq!(
            status_error("openai", 401, "bad key"),
            BackendError::RequestFailed("openai: HTTP 401: bad key".to_string())
        );
    }
}
