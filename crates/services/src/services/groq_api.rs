//! Groq API client for the AI-assisted features.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

#[derive(Debug, Clone, Error)]
pub enum GroqApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: GROQ_API_KEY environment variable not set")]
    MissingApiKey,
}

impl GroqApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from the chat completions endpoint
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Text of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Groq chat completions client
#[derive(Debug, Clone)]
pub struct GroqApiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GroqApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new client using the GROQ_API_KEY environment variable
    pub fn from_env() -> Result<Self, GroqApiError> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| GroqApiError::MissingApiKey)?;
        Self::new(api_key, None)
    }

    /// Create a new client with the given API key
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, GroqApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("gitstack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GroqApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Send a completion request, retrying transient failures
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<CompletionResponse, GroqApiError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
        };

        (|| async { self.send_request(&request).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(20))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &GroqApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Groq API call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, GroqApiError> {
        let res = self
            .http
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<CompletionResponse>()
                .await
                .map_err(|e| GroqApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(GroqApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(GroqApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GroqApiError::Http { status, body })
            }
        }
    }

    /// Send a single prompt with an optional system message and return the
    /// response text verbatim.
    pub async fn ask(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: u32,
    ) -> Result<String, GroqApiError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let response = self.complete(messages, max_tokens).await?;

        response
            .text()
            .map(|s| s.to_string())
            .ok_or_else(|| GroqApiError::Serde("No choices in response".to_string()))
    }

    /// Send a prompt expecting JSON in the response
    pub async fn ask_json<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: u32,
    ) -> Result<T, GroqApiError> {
        let response = self.ask(prompt, system, max_tokens).await?;

        if response.trim().is_empty() {
            tracing::error!("Groq returned an empty response");
            return Err(GroqApiError::Serde("Empty response from Groq".to_string()));
        }

        let json_str = extract_json(&response);

        serde_json::from_str(json_str).map_err(|e| {
            tracing::error!(
                json_error = %e,
                extracted_json_preview = %json_str.chars().take(500).collect::<String>(),
                "Failed to parse JSON response from Groq"
            );
            GroqApiError::Serde(e.to_string())
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GroqApiError {
    if e.is_timeout() {
        GroqApiError::Timeout
    } else {
        GroqApiError::Transport(e.to_string())
    }
}

/// Extract JSON from a string that might contain markdown code blocks
pub(crate) fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        // Skip past any language identifier on the same line
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"pattern": "\\d+"}"#;
        assert_eq!(extract_json(input), r#"{"pattern": "\\d+"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "Here you go:\n```json\n{\"pattern\": \"a+\"}\n```";
        assert_eq!(extract_json(input), r#"{"pattern": "a+"}"#);
    }

    #[test]
    fn test_extract_json_generic_code_block() {
        let input = "```\n{\"pattern\": \"a+\"}\n```";
        assert_eq!(extract_json(input), r#"{"pattern": "a+"}"#);
    }

    #[test]
    fn test_first_choice_text() {
        let response = CompletionResponse {
            id: "cmpl-1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: "hello".to_string(),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        };
        assert_eq!(response.text(), Some("hello"));
    }
}
