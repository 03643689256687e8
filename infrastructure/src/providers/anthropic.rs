//! Anthropic Messages API adapter

use super::ProviderAdapter;
use super::http::{build_client, read_body, status_error, transport_error};
use async_trait::async_trait;
use council_application::ports::model_backend::BackendError;
use council_domain::StagePrompt;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "anthropic";

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    client: reqwest::Client,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        api_version: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| BackendError::RequestFailed("invalid API key format".to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version)
                .map_err(|_| BackendError::RequestFailed("invalid API version".to_string()))?,
        );

        Ok(Self {
            client: build_client(headers, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

fn request_body<'a>(
    model: &'a str,
    prompt: &'a StagePrompt,
    max_tokens: u32,
) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens,
        system: &prompt.system,
        messages: [UserMessage {
            role: "user",
            content: &prompt.user,
        }],
    }
}

/// Concatenate the text blocks of a reply.
fn parse_reply(body: &str) -> Result<String, BackendError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::InvalidResponse(format!("{PROVIDER}: {e}")))?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(BackendError::InvalidResponse(format!("{PROVIDER}: empty completion")));
    }
    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .unwrap_or_default()
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, model: &str, prompt: &StagePrompt) -> Result<String, BackendError> {
        debug!("{}: messages call with {}", PROVIDER, model);
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .json(&request_body(model, prompt, self.max_tokens))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        let body = read_body(PROVIDER, response).await?;
        if !status.is_success() {
            return Err(status_error(PROVIDER, status.as_u16(), &error_message(&body)));
        }
        parse_reply(&body)
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        let body = read_body(PROVIDER, response).await?;
        if !status.is_success() {
            return Err(status_error(PROVIDER, status.as_u16(), &error_message(&body)));
        }
        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("{PROVIDER}: {e}")))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let p = StagePrompt {
            system: "be brief".to_string(),
            user: "hello".to_string(),
        };
        let body = serde_json::to_value(request_body("claude-sonnet-4-5", &p, 1024)).unwrap();
        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_reply_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"Hello, "},{"type":"tool_use","id":"x"},{"type":"text","text":"world"}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Hello, world");
    }

    #[test]
    fn test_parse_reply_empty() {
        assert!(matches!(parse_reply(r#"{"content":[]}"#), Err(BackendError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(error_message(body), "Overloaded");
    }
}
