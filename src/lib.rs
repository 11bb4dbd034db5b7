//! Roundtable: three LLM personas discussing a topic in turn.
//!
//! The crate is organised leaf first:
//!
//! - [`chat`] and [`backends`]: the completion provider seam and the Groq client
//! - [`topic`]: topic validation
//! - [`persona`]: persona ids and the registry mapping them to models
//! - [`dialogue`]: turns, the stateless orchestrator and the client-side conversation
//! - [`api`]: the HTTP boundary (feature `api`)
//! - [`config`]: TOML configuration

pub mod backends;
pub mod chat;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod persona;
pub mod topic;

#[cfg(feature = "api")]
pub mod api;

pub use dialogue::{Conversation, DialogueError, Orchestrator, Speaker, Turn, TurnSource};
pub use error::LLMError;
pub use persona::{PersonaId, PersonaRegistry};
pub use topic::{TopicError, TopicValidator};
