use super::{GenerationError, Generator, get_api_key};
use crate::config::GeneratorConfig;
use crate::prompt::GenerationRequest;
use crate::utils::error::{AppError, AppResult};
use crate::utils::format::truncate_string;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Longest pause between connection retries.
const MAX_BACKOFF: Duration = Duration::from_secs(4);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Value,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> AppResult<Self> {
        // Config first, then environment
        let api_key = config
            .api_key
            .clone()
            .or_else(get_api_key)
            .ok_or_else(|| {
                AppError::Config(
                    "Generator API key not found. Set generator.api_key or NUMEROGRAPH_API_KEY / OPENAI_API_KEY"
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .user_agent(concat!("numerograph/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, api_key })
    }

    async fn send_once(&self, request: &GenerationRequest) -> Result<String, CallError> {
        let payload = ChatRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens.min(self.config.max_tokens),
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Fatal(format!(
                "generator error {}: {}",
                status,
                truncate_string(&body, 320)
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CallError::Fatal(format!("invalid generator response: {}", e)))?;

        let choice = body
            .choices
            .first()
            .ok_or_else(|| CallError::Fatal("generator response did not include choices".to_string()))?;

        Ok(extract_text(&choice.message.content))
    }
}

/// Outcome of one HTTP attempt: connection problems are retried, everything else is not.
enum CallError {
    Retryable(GenerationError),
    Fatal(String),
}

impl CallError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CallError::Retryable(GenerationError::Timeout(Duration::ZERO))
        } else if e.is_connect() || e.is_request() {
            CallError::Retryable(GenerationError::Unavailable(format!("connection failed: {}", e)))
        } else {
            CallError::Fatal(format!("request failed: {}", e))
        }
    }
}

pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(8)).min(MAX_BACKOFF)
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let attempts = self.config.retry_count.max(1);
        let mut attempt = 1;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(CallError::Fatal(msg)) => return Err(GenerationError::Unavailable(msg)),
                Err(CallError::Retryable(err)) if attempt >= attempts => {
                    return Err(match err {
                        GenerationError::Timeout(_) => {
                            GenerationError::Timeout(Duration::from_secs(self.config.timeout_secs))
                        }
                        other => other,
                    });
                }
                Err(CallError::Retryable(err)) => {
                    let wait = backoff(attempt);
                    warn!(section = %request.kind, attempt, error = %err, "generator call failed, retrying in {:?}", wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

fn extract_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
