//! Client for a remote conversation API.

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::types::{ConversationRequest, ConversationResponse, ErrorBody, WireMessage};
use crate::dialogue::{DialogueError, Speaker, Turn, TurnSource};
use crate::error::LLMError;
use crate::persona::PersonaRegistry;

/// Requests turns from a running server instead of calling the model directly.
///
/// Every failure response of the server, including a rejected topic, is
/// reported as an upstream error carrying the server's status.
#[derive(Debug, Clone)]
pub struct RemoteOrchestrator {
    client: Client,
    endpoint: Url,
    personas: PersonaRegistry,
}

impl RemoteOrchestrator {
    pub fn new(base_url: &str, personas: PersonaRegistry) -> Result<Self, LLMError> {
        Self::with_client(Client::new(), base_url, personas)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        personas: PersonaRegistry,
    ) -> Result<Self, LLMError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("/api/conversation"))
            .map_err(|e| LLMError::InvalidRequest(format!("Invalid server URL {base_url}: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            personas,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TurnSource for RemoteOrchestrator {
    async fn next_turn(&self, topic: &str, window: &[Turn]) -> Result<Turn, DialogueError> {
        let body = ConversationRequest {
            topic: topic.to_string(),
            messages: window
                .iter()
                .map(|turn| WireMessage {
                    id: turn.sequence(),
                    text: turn.text().to_string(),
                    sender: turn.speaker().label(&self.personas).to_string(),
                })
                .collect(),
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(LLMError::from)?;

        let status = resp.status();
        let raw = resp.text().await.map_err(LLMError::from)?;
        if !status.is_success() {
            return Err(DialogueError::Upstream {
                status: Some(status.as_u16()),
                message: error_message(&raw),
            });
        }

        let parsed: ConversationResponse =
            serde_json::from_str(&raw).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode conversation response: {e}"),
                raw_response: raw,
            })?;
        Ok(Turn::new(
            Turn::next_sequence(window),
            Speaker::from_sender(&parsed.response.sender, &self.personas),
            parsed.response.text,
        ))
    }
}

fn error_message(raw: &str) -> String {
    let Ok(body) = serde_json::from_str::<ErrorBody>(raw) else {
        return raw.to_string();
    };
    let detail = body
        .details
        .as_ref()
        .and_then(|d| d.get("message").or_else(|| d.get("reason")))
        .and_then(|m| m.as_str());
    match detail {
        Some(detail) => format!("{}: {detail}", body.error),
        None => body.error,
    }
}
