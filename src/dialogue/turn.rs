//! Conversation turns and their speakers.

use crate::persona::{PersonaId, PersonaRegistry};

/// Sender label for system turns (the seed and error notices).
pub const SYSTEM_SENDER: &str = "System";
/// Sender label the browser client uses for user-authored interventions.
pub const USER_SENDER: &str = "Claude";

/// Who authored a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    Persona(PersonaId),
    System,
    User,
    /// A sender label that matches nothing known; kept verbatim.
    Other(String),
}

impl Speaker {
    /// Parses a wire sender label.
    ///
    /// Persona display names match exactly; the system and user labels match
    /// case-insensitively.
    pub fn from_sender(sender: &str, personas: &PersonaRegistry) -> Self {
        if let Some(id) = personas.find_by_display_name(sender) {
            Speaker::Persona(id)
        } else if sender.eq_ignore_ascii_case(SYSTEM_SENDER) {
            Speaker::System
        } else if sender.eq_ignore_ascii_case(USER_SENDER) {
            Speaker::User
        } else {
            Speaker::Other(sender.to_string())
        }
    }

    /// Renders the speaker as a wire sender label.
    pub fn label<'a>(&'a self, personas: &'a PersonaRegistry) -> &'a str {
        match self {
            Speaker::Persona(id) => personas.display_name(*id),
            Speaker::System => SYSTEM_SENDER,
            Speaker::User => USER_SENDER,
            Speaker::Other(label) => label,
        }
    }

    pub fn persona(&self) -> Option<PersonaId> {
        match self {
            Speaker::Persona(id) => Some(*id),
            _ => None,
        }
    }
}

/// One message of a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    sequence: u64,
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn new(sequence: u64, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            sequence,
            speaker,
            text: text.into(),
        }
    }

    /// The system turn that opens a discussion of `topic`.
    pub fn seed(topic: &str) -> Self {
        Self::new(0, Speaker::System, format!("Let's discuss: {topic}"))
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Sequence number of the turn that follows `window`.
    ///
    /// An empty window stands for the seed alone.
    pub fn next_sequence(window: &[Turn]) -> u64 {
        window
            .last()
            .map_or(0, |t| t.sequence)
            .saturating_add(1)
    }

    pub fn speaker(&self) -> &Speaker {
        &self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
