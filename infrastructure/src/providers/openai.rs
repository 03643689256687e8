//! OpenAI-compatible chat completions adapter
//!
//! Works against OpenAI itself and any endpoint exposing the same
//! `/chat/completions` and `/models` routes (OpenRouter, local servers).

use super::ProviderAdapter;
use super::http::{build_client, read_body, status_error, transport_error};
use async_trait::async_trait;
use council_application::ports::model_backend::BackendError;
use council_domain::StagePrompt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleAdapter {
    name: String,
    client: reqwest::Client,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiCompatibleAdapter {
    /// `api_key` may be `None` for endpoints that do not authenticate.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<&str>,
        max_tokens: Option<u32>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| BackendError::RequestFailed("invalid API key format".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            name: name.into(),
            client: build_client(headers, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

// ==================== API types ====================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
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
    max_tokens: Option<u32>,
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !prompt.system.is_empty() {
        messages.push(ApiMessage {
            role: "system",
            content: &prompt.system,
        });
    }
    messages.push(ApiMessage {
        role: "user",
        content: &prompt.user,
    });
    ChatRequest {
        model,
        messages,
        max_tokens,
    }
}

fn parse_reply(provider: &str, body: &str) -> Result<String, BackendError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::InvalidResponse(format!("{provider}: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| BackendError::InvalidResponse(format!("{provider}: empty completion")))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .unwrap_or_default()
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, model: &str, prompt: &StagePrompt) -> Result<String, BackendError> {
        debug!("{}: chat completion with {}", self.name, model);
        let response = self
            .client
            .post(self.chat_url())
            .json(&request_body(model, prompt, self.max_tokens))
            .send()
            .await
            .map_err(|e| transport_error(&self.name, e))?;

        let status = response.status();
        let body = read_body(&self.name, response).await?;
        if !status.is_success() {
            return Err(status_error(&self.name, status.as_u16(), &error_message(&body)));
        }
        parse_reply(&self.name, &body)
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.models_url())
            .send()
            .await
            .map_err(|e| transport_error(&self.name, e))?;

        let status = response.status();
        let body = read_body(&self.name, response).await?;
        if !status.is_success() {
            return Err(status_error(&self.name, status.as_u16(), &error_message(&body)));
        }
        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("{}: {e}", self.name)))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}
