use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LLMError;

use super::message::ChatMessage;
use super::usage::Usage;

pub trait ChatResponse: std::fmt::Debug + std::fmt::Display + Send + Sync {
    fn text(&self) -> Option<String>;
    fn usage(&self) -> Option<Usage> {
        None
    }
}

/// Sampling configuration sent with every completion request.
///
/// Responses are never streamed; providers always request a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.8,
            top_p: 1.0,
        }
    }
}

/// Trait for providers that support chat-style interactions.
///
/// One provider instance serves every persona, so the model is chosen per call.
#[async_trait]
pub trait ChatProvider: Sync + Send {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        sampling: &SamplingParams,
    ) -> Result<Box<dyn ChatResponse>, LLMError>;
}
