#[path = "handlers/conversation.rs"]
mod conversation;

#[path = "handlers/helpers.rs"]
mod helpers;

pub use conversation::{handle_conversation, handle_ready, handle_topics};
pub use helpers::{ApiError, ApiResult};
