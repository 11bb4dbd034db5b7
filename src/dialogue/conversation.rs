//! Client-side conversation state.

use thiserror::Error;

use crate::topic::{TopicError, TopicValidator};

use super::{tail, Speaker, Turn, TurnSource};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("no topic selected")]
    NoTopic,
    #[error("message is empty")]
    EmptyMessage,
}

/// The authoritative turn list of one conversation.
///
/// Calls take `&mut self`, so at most one request is in flight at a time.
#[derive(Debug, Clone)]
pub struct Conversation {
    topic: Option<String>,
    turns: Vec<Turn>,
    window_size: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_window_size(5)
    }

    pub fn with_window_size(window_size: usize) -> Self {
        Self {
            topic: None,
            turns: Vec::new(),
            window_size,
        }
    }

    /// Starts a conversation about `topic`, replacing any previous one.
    pub fn select_topic(
        &mut self,
        validator: &TopicValidator,
        topic: &str,
    ) -> Result<&Turn, TopicError> {
        let topic = validator.validate(topic)?;
        self.turns.clear();
        self.turns.push(Turn::seed(&topic));
        self.topic = Some(topic);
        Ok(&self.turns[0])
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The turns sent along with the next request.
    pub fn window(&self) -> &[Turn] {
        tail(&self.turns, self.window_size)
    }

    /// Asks `source` for the next turn and appends it.
    ///
    /// A failed request is recorded as a system turn instead of being dropped.
    pub async fn advance<S>(&mut self, source: &S) -> Result<&Turn, ConversationError>
    where
        S: TurnSource + ?Sized,
    {
        let topic = self.topic.clone().ok_or(ConversationError::NoTopic)?;
        let (speaker, text) = match source.next_turn(&topic, self.window()).await {
            Ok(turn) => (turn.speaker().clone(), turn.text().to_string()),
            Err(err) => {
                log::warn!("turn request failed: {err}");
                (Speaker::System, format!("Error: {err}"))
            }
        };
        Ok(self.push(speaker, text))
    }

    /// Appends a user message, then asks for the next turn.
    pub async fn intervene<S>(&mut self, text: &str, source: &S) -> Result<&Turn, ConversationError>
    where
        S: TurnSource + ?Sized,
    {
        if self.topic.is_none() {
            return Err(ConversationError::NoTopic);
        }
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        self.push(Speaker::User, text.to_string());
        self.advance(source).await
    }

    /// Clears the turns and the selected topic.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.topic = None;
    }

    fn push(&mut self, speaker: Speaker, text: String) -> &Turn {
        let sequence = self.turns.len() as u64;
        self.turns.push(Turn::new(sequence, speaker, text));
        &self.turns[self.turns.len() - 1]
    }
}
