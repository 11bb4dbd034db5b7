//! Discussion topic validation.
//!
//! A topic is accepted when its trimmed length is within bounds, it contains
//! none of the denied terms as a whole word, and every character is an ASCII
//! word character or whitespace. The character rule also rejects ordinary
//! punctuation such as `?` or `'`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Topics offered by the client's topic picker.
pub const PREDEFINED_TOPICS: [&str; 8] = [
    "The Future of AI",
    "Climate Change Solutions",
    "Space Exploration",
    "Ethics in Technology",
    "Global Economic Trends",
    "Artificial Intelligence and Creativity",
    "Sustainable Development",
    "Quantum Computing Breakthroughs",
];

const DEFAULT_DENY_TERMS: [&str; 12] = [
    "fuck",
    "shit",
    "damn",
    "hate",
    "stupid",
    "bad",
    "offensive",
    "inappropriate",
    "porn",
    "sex",
    "racist",
    "sexist",
];

/// Why a topic's content was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIssue {
    /// A denied term appears as a whole word.
    DeniedTerm(String),
    /// A character outside the allowed set.
    DisallowedCharacter(char),
}

impl std::fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentIssue::DeniedTerm(term) => write!(f, "contains the disallowed term \"{term}\""),
            ContentIssue::DisallowedCharacter(c) => write!(f, "contains the disallowed character '{c}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("topic must be between {min} and {max} characters, got {length}")]
    Length {
        length: usize,
        min: usize,
        max: usize,
    },
    #[error("topic {0}")]
    Content(ContentIssue),
}

/// Topic rules as read from the `[topic]` config section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub deny_terms: Vec<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 100,
            deny_terms: DEFAULT_DENY_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TopicValidator {
    min_length: usize,
    max_length: usize,
    deny: Option<Regex>,
    disallowed: Regex,
}

impl TopicValidator {
    pub fn new(config: &TopicConfig) -> Result<Self, regex::Error> {
        let terms: Vec<String> = config
            .deny_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        let deny = if terms.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|")))?)
        };
        Ok(Self {
            min_length: config.min_length,
            max_length: config.max_length,
            deny,
            disallowed: Regex::new(r"[^A-Za-z0-9_\s]")?,
        })
    }

    /// Validates a topic and returns it trimmed.
    pub fn validate(&self, topic: &str) -> Result<String, TopicError> {
        let trimmed = topic.trim();
        let length = trimmed.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(TopicError::Length {
                length,
                min: self.min_length,
                max: self.max_length,
            });
        }

        if let Some(found) = self.deny.as_ref().and_then(|re| re.find(trimmed)) {
            return Err(TopicError::Content(ContentIssue::DeniedTerm(
                found.as_str().to_lowercase(),
            )));
        }

        if let Some(found) = self.disallowed.find(trimmed) {
            let c = found.as_str().chars().next().unwrap_or_default();
            return Err(TopicError::Content(ContentIssue::DisallowedCharacter(c)));
        }

        Ok(trimmed.to_string())
    }
}

impl Default for TopicValidator {
    fn default() -> Self {
        // The built-in term list contains only plain words.
        Self::new(&TopicConfig::default()).expect("default topic rules compile")
    }
}
