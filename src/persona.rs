//! Persona identities and the registry that maps them to models.

use serde::{Deserialize, Serialize};

use crate::dialogue::{Speaker, SYSTEM_SENDER, USER_SENDER};

/// Identifier of a discussion persona.
///
/// Rotation is keyed on this enum only; display names are for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    Contrarian,
    Analyst,
    Creative,
}

impl PersonaId {
    /// All personas in rotation order.
    pub const ALL: [PersonaId; 3] = [
        PersonaId::Contrarian,
        PersonaId::Analyst,
        PersonaId::Creative,
    ];

    /// The persona that opens a conversation.
    #[must_use]
    pub const fn first() -> Self {
        PersonaId::Contrarian
    }

    /// Picks the persona that answers after `last`.
    ///
    /// Contrarian hands over to Analyst, Analyst to Creative. Everything else,
    /// including system and user turns, goes back to Contrarian, so a user
    /// intervention restarts the cycle.
    #[must_use]
    pub fn successor_of(last: Option<&Speaker>) -> Self {
        match last {
            Some(Speaker::Persona(PersonaId::Contrarian)) => PersonaId::Analyst,
            Some(Speaker::Persona(PersonaId::Analyst)) => PersonaId::Creative,
            _ => Self::first(),
        }
    }

    const fn index(self) -> usize {
        match self {
            PersonaId::Contrarian => 0,
            PersonaId::Analyst => 1,
            PersonaId::Creative => 2,
        }
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PersonaId::Contrarian => "contrarian",
            PersonaId::Analyst => "analyst",
            PersonaId::Creative => "creative",
        };
        f.write_str(name)
    }
}

/// A configured identity that can author a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Model identifier, e.g. "llama-3.3-70b-versatile".
    pub model_id: String,
    /// Name shown to users and sent as the turn's sender.
    pub display_name: String,
    pub system_prompt: String,
}

/// `[personas]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonasConfig {
    pub contrarian: Persona,
    pub analyst: Persona,
    pub creative: Persona,
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            contrarian: Persona {
                model_id: "llama-3.3-70b-versatile".to_string(),
                display_name: "Llama 3.3 70B".to_string(),
                system_prompt: "You are a sharp, contrarian intellectual. Deliver your arguments with precision and wit. Keep your responses concise - aim for 2-3 sentences that pack a punch. Your goal is to make every word count, providing a clear, provocative perspective without unnecessary elaboration.".to_string(),
            },
            analyst: Persona {
                model_id: "llama-3.2-90b-vision-preview".to_string(),
                display_name: "Llama 3.2 90B".to_string(),
                system_prompt: "You are an analytical thinker who dissects complex topics with surgical precision. Craft your responses to be crisp and impactful - no more than 3-4 sentences. Be direct, expose key insights, and challenge assumptions efficiently. Prioritize clarity and intellectual depth over verbosity.".to_string(),
            },
            creative: Persona {
                model_id: "mixtral-8x7b-32768".to_string(),
                display_name: "Mixtral 8x7B".to_string(),
                system_prompt: "You are a versatile and creative. Approach each topic with a blend of technical insight and imaginative thinking. Provide responses that are both intellectually rigorous and engaging, balancing depth with accessibility, and keep your responses concise with no more than 2-3 sentences. Communicate clearly and effectively.".to_string(),
            },
        }
    }
}

/// Reasons a persona table is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersonaTableError {
    #[error("persona {0} has an empty {1}")]
    Empty(PersonaId, &'static str),
    #[error("personas {0} and {1} share the display name \"{2}\"")]
    DuplicateName(PersonaId, PersonaId, String),
    #[error("persona {0} uses the reserved sender label \"{1}\"")]
    ReservedName(PersonaId, String),
}

/// Fixed table mapping persona ids to their configuration.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: [Persona; 3],
}

impl PersonaRegistry {
    pub fn new(config: PersonasConfig) -> Result<Self, PersonaTableError> {
        let PersonasConfig {
            contrarian,
            analyst,
            creative,
        } = config;
        let personas = [contrarian, analyst, creative];
        for id in PersonaId::ALL {
            validate_persona(id, &personas[id.index()])?;
        }

        for (i, a) in PersonaId::ALL.iter().enumerate() {
            for b in &PersonaId::ALL[i + 1..] {
                let name = &personas[a.index()].display_name;
                if name == &personas[b.index()].display_name {
                    return Err(PersonaTableError::DuplicateName(*a, *b, name.clone()));
                }
            }
        }

        Ok(Self { personas })
    }

    /// Looks up a persona by id.
    #[must_use]
    pub fn get(&self, id: PersonaId) -> &Persona {
        &self.personas[id.index()]
    }

    /// Translates a display name back into a persona id.
    #[must_use]
    pub fn find_by_display_name(&self, name: &str) -> Option<PersonaId> {
        PersonaId::ALL
            .into_iter()
            .find(|id| self.get(*id).display_name == name)
    }

    #[must_use]
    pub fn display_name(&self, id: PersonaId) -> &str {
        &self.get(id).display_name
    }

    pub fn iter(&self) -> impl Iterator<Item = (PersonaId, &Persona)> {
        PersonaId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new(PersonasConfig::default()).expect("built-in persona table is valid")
    }
}

fn validate_persona(id: PersonaId, persona: &Persona) -> Result<(), PersonaTableError> {
    if persona.model_id.trim().is_empty() {
        return Err(PersonaTableError::Empty(id, "model_id"));
    }
    if persona.display_name.trim().is_empty() {
        return Err(PersonaTableError::Empty(id, "display_name"));
    }
    if persona.system_prompt.trim().is_empty() {
        return Err(PersonaTableError::Empty(id, "system_prompt"));
    }
    for reserved in [SYSTEM_SENDER, USER_SENDER] {
        if persona.display_name.eq_ignore_ascii_case(reserved) {
            return Err(PersonaTableError::ReservedName(
                id,
                persona.display_name.clone(),
            ));
        }
    }
    Ok(())
}
