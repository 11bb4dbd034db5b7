//! Groq API client implementation for chat completions.
//!
//! Groq exposes an OpenAI-compatible `chat/completions` endpoint; every persona
//! model is served through the same client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatMessage, ChatProvider, ChatResponse, SamplingParams, Usage},
    error::LLMError,
};

/// Default endpoint for Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/";

/// Configuration for the Groq client.
#[derive(Debug)]
pub struct GroqConfig {
    /// API key for authentication with Groq.
    pub api_key: SecretString,
    /// Base URL, always ending with a slash.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
}

/// Client for interacting with Groq's API.
///
/// The client uses `Arc` internally for configuration, making cloning cheap.
#[derive(Debug, Clone)]
pub struct Groq {
    /// Shared configuration wrapped in Arc for cheap cloning.
    pub config: Arc<GroqConfig>,
    /// HTTP client for making requests.
    pub client: Client,
}

#[derive(Serialize)]
struct GroqChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct GroqChatRequest<'a> {
    model: &'a str,
    messages: Vec<GroqChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct GroqChatResponse {
    choices: Vec<GroqChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct GroqChatChoice {
    message: GroqChatMsg,
}

#[derive(Deserialize, Debug)]
struct GroqChatMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct GroqErrorEnvelope {
    error: GroqErrorBody,
}

#[derive(Deserialize)]
struct GroqErrorBody {
    message: String,
}

impl std::fmt::Display for GroqChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "No response content"),
        }
    }
}

impl ChatResponse for GroqChatResponse {
    fn text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|content| !content.is_empty())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl Groq {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        let client = builder
            .build()
            .map_err(|e| LLMError::HttpError(e.to_string()))?;
        Self::with_client(client, api_key, base_url, timeout_seconds)
    }

    /// Creates a new Groq client with a custom HTTP client.
    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        Ok(Self {
            config: Arc::new(GroqConfig {
                api_key: SecretString::new(api_key.into()),
                base_url,
                timeout_seconds,
            }),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.config.timeout_seconds
    }

    fn completions_url(&self) -> Result<Url, LLMError> {
        self.config
            .base_url
            .join("chat/completions")
            .map_err(|e| LLMError::HttpError(e.to_string()))
    }

    async fn ensure_success_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, LLMError> {
        log::debug!("Groq HTTP status: {}", response.status());
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GroqErrorEnvelope>(&raw)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });
        Err(LLMError::ProviderError {
            status: status.as_u16(),
            message,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, LLMError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| LLMError::InvalidRequest(format!("Invalid base URL {raw}: {e}")))
}

#[async_trait]
impl ChatProvider for Groq {
    /// Sends a chat request to Groq's API.
    ///
    /// # Arguments
    ///
    /// * `model` - Model identifier, e.g. `llama-3.3-70b-versatile`
    /// * `messages` - The conversation as role-tagged chat messages
    /// * `sampling` - Sampling parameters for this request
    ///
    /// # Returns
    ///
    /// The provider's response or an error
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        sampling: &SamplingParams,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        let api_key = self.config.api_key.expose_secret();
        if api_key.is_empty() {
            return Err(LLMError::AuthError("Missing Groq API key".to_string()));
        }

        let body = GroqChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| GroqChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            stream: false,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Groq request payload: {}", json);
            }
        }

        let resp = self
            .client
            .post(self.completions_url()?)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let resp = self.ensure_success_response(resp).await?;

        let resp_text = resp.text().await?;
        let parsed: GroqChatResponse =
            serde_json::from_str(&resp_text).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode Groq response: {e}"),
                raw_response: resp_text,
            })?;
        Ok(Box::new(parsed))
    }
}
