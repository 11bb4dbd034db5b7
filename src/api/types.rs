//! JSON bodies of the conversation API.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/conversation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub topic: String,
    pub messages: Vec<WireMessage>,
}

/// A turn as exchanged with the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Any JSON integer; negative ids count as 0.
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    pub text: String,
    pub sender: String,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireId {
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match WireId::deserialize(deserializer)? {
        WireId::Unsigned(id) => id,
        WireId::Signed(id) => u64::try_from(id).unwrap_or(0),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub response: ResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub text: String,
    pub sender: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}
