//! Persona dialogue module.
//!
//! Three personas take turns discussing a topic. The [`Orchestrator`] produces
//! one turn per call from a bounded window of recent turns and keeps no state
//! between calls; the [`Conversation`] owns the full history on the client side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LLMError;
use crate::topic::TopicError;

mod conversation;
mod orchestrator;
mod turn;

pub use conversation::{Conversation, ConversationError};
pub use orchestrator::{build_context, fallback_text, Orchestrator, OrchestratorBuilder};
pub use turn::{Speaker, Turn, SYSTEM_SENDER, USER_SENDER};

/// Window sizes for a dialogue, from the `[dialogue]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Turns a client sends, and the orchestrator accepts, per request.
    pub window_size: usize,
    /// Turns forwarded to the model as context.
    pub context_size: usize,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            window_size: 5,
            context_size: 4,
        }
    }
}

/// Failure kinds of a dialogue turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    /// The topic failed validation; nothing was sent upstream.
    #[error("invalid topic: {0}")]
    InvalidTopic(#[from] TopicError),
    /// The completion service failed or returned something unusable.
    #[error("upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// Any other local fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LLMError> for DialogueError {
    fn from(err: LLMError) -> Self {
        let status = err.status();
        match err {
            LLMError::ProviderError { message, .. } | LLMError::AuthError(message) => {
                DialogueError::Upstream { status, message }
            }
            LLMError::HttpError(_)
            | LLMError::ResponseFormatError { .. }
            | LLMError::JsonError(_) => DialogueError::Upstream {
                status,
                message: err.to_string(),
            },
            LLMError::InvalidRequest(_) | LLMError::Generic(_) => {
                DialogueError::Internal(err.to_string())
            }
        }
    }
}

/// Anything that can produce the next turn of a conversation.
#[async_trait]
pub trait TurnSource: Send + Sync {
    async fn next_turn(&self, topic: &str, window: &[Turn]) -> Result<Turn, DialogueError>;
}

/// Returns the last `n` turns of `turns`.
pub(crate) fn tail(turns: &[Turn], n: usize) -> &[Turn] {
    &turns[turns.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_map_to_upstream() {
        let err: DialogueError = LLMError::ProviderError {
            status: 503,
            message: "overloaded".into(),
        }
        .into();
        assert_eq!(
            err,
            DialogueError::Upstream {
                status: Some(503),
                message: "overloaded".into()
            }
        );

        let err: DialogueError = LLMError::AuthError("Missing Groq API key".into()).into();
        assert!(matches!(err, DialogueError::Upstream { status: Some(401), .. }));

        let err: DialogueError = LLMError::HttpError("timed out".into()).into();
        assert!(matches!(err, DialogueError::Upstream { status: None, .. }));
    }

    #[test]
    fn local_failures_map_to_internal() {
        let err: DialogueError = LLMError::Generic("boom".into()).into();
        assert!(matches!(err, DialogueError::Internal(msg) if msg.contains("boom")));
    }

    #[test]
    fn tail_keeps_the_most_recent_turns() {
        let turns: Vec<Turn> = (0..7)
            .map(|i| Turn::new(i, Speaker::System, i.to_string()))
            .collect();
        let last = tail(&turns, 5);
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].sequence(), 2);
        assert_eq!(tail(&turns[..2], 5).len(), 2);
    }
}
