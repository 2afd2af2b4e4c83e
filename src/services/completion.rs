// src/services/completion.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{config::Settings, error::CompletionError};

/// One-shot chat completion: a single user message in, the first choice's text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
    n: u8,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [RequestMessage { role: "user", content: text }],
            n: 1,
        };

        tracing::debug!(model = %self.model, chars = text.chars().count(), "sending completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::Network)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(CompletionError::Network)?;

        if !status.is_success() {
            return Err(classify_status(status, &bytes));
        }

        extract_reply(&bytes)
    }
}

/// Map a non-2xx upstream response to its failure class.
pub fn classify_status(status: StatusCode, body: &[u8]) -> CompletionError {
    let message = upstream_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { message },
        _ => CompletionError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<UpstreamErrorBody>(body) {
        if !parsed.error.message.trim().is_empty() {
            return parsed.error.message;
        }
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("no details")
        .to_string()
}

/// Pull the first choice's content out of a successful response body.
pub fn extract_reply(body: &[u8]) -> Result<String, CompletionError> {
    let parsed: CompletionResponse = serde_json::from_slice(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("response contained no choices".into()))?;

    choice
        .message
        .content
        .ok_or_else(|| CompletionError::MalformedResponse("first choice has no content".into()))
}
