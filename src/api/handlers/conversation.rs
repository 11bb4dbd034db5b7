use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use super::helpers::{bad_request, ApiError, ApiResult, INVALID_MESSAGES, INVALID_TOPIC};
use crate::api::types::{
    ConversationResponse, ReadyResponse, ResponseMessage, TopicsResponse, WireMessage,
};
use crate::api::ServerState;
use crate::dialogue::{DialogueError, Speaker, Turn};
use crate::persona::PersonaRegistry;
use crate::topic::PREDEFINED_TOPICS;

pub async fn handle_conversation(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ConversationResponse>> {
    let request_id = Uuid::new_v4();
    let Json(body) = payload.map_err(|rejection| {
        log::debug!("[{request_id}] rejected body: {rejection}");
        bad_request(INVALID_MESSAGES, Some(json!({ "reason": rejection.body_text() })))
    })?;

    let topic = body
        .get("topic")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request(INVALID_TOPIC, None))?;
    if let Err(reason) = state.orchestrator.topics().validate(topic) {
        log::debug!("[{request_id}] invalid topic {topic:?}: {reason}");
        return Err(DialogueError::InvalidTopic(reason).into());
    }
    let messages = parse_messages(&body)?;

    let personas = state.orchestrator.personas();
    let window = build_window(messages, personas);

    let turn = state
        .orchestrator
        .next_turn(topic, &window)
        .await
        .map_err(|err| {
            match &err {
                DialogueError::InvalidTopic(reason) => {
                    log::debug!("[{request_id}] invalid topic {topic:?}: {reason}")
                }
                other => log::error!("[{request_id}] conversation turn failed: {other}"),
            }
            ApiError::from(err)
        })?;

    Ok(Json(ConversationResponse {
        response: ResponseMessage {
            text: turn.text().to_string(),
            sender: turn.speaker().label(personas).to_string(),
        },
    }))
}

pub async fn handle_ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        message: "Conversation API is ready".to_string(),
    })
}

pub async fn handle_topics() -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: PREDEFINED_TOPICS.iter().map(|t| t.to_string()).collect(),
    })
}

fn parse_messages(body: &Value) -> ApiResult<Vec<WireMessage>> {
    let raw = body
        .get("messages")
        .filter(|m| m.is_array())
        .ok_or_else(|| bad_request(INVALID_MESSAGES, None))?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        bad_request(INVALID_MESSAGES, Some(json!({ "reason": e.to_string() })))
    })
}

fn build_window(messages: Vec<WireMessage>, personas: &PersonaRegistry) -> Vec<Turn> {
    messages
        .into_iter()
        .map(|msg| Turn::new(msg.id, Speaker::from_sender(&msg.sender, personas), msg.text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaId;

    #[test]
    fn messages_must_be_an_array_of_turns() {
        assert!(parse_messages(&json!({ "topic": "x" })).is_err());
        assert!(parse_messages(&json!({ "messages": "nope" })).is_err());
        assert!(parse_messages(&json!({ "messages": [{ "text": "no sender" }] })).is_err());
        let parsed = parse_messages(&json!({
            "messages": [{ "id": 0, "text": "Let's discuss: AI", "sender": "System" }]
        }))
        .unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn any_integer_id_is_accepted() {
        let parsed = parse_messages(&json!({
            "messages": [
                { "id": u64::MAX, "text": "a", "sender": "System" },
                { "id": -1, "text": "b", "sender": "Claude" },
                { "id": i64::MIN, "text": "c", "sender": "Claude" }
            ]
        }))
        .unwrap();
        let ids: Vec<u64> = parsed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![u64::MAX, 0, 0]);
        assert!(parse_messages(&json!({
            "messages": [{ "id": "seven", "text": "a", "sender": "System" }]
        }))
        .is_err());
    }

    #[test]
    fn window_resolves_sender_labels() {
        let personas = PersonaRegistry::default();
        let window = build_window(
            vec![
                WireMessage {
                    id: 4,
                    text: "a".into(),
                    sender: "Llama 3.2 90B".into(),
                },
                WireMessage {
                    id: 5,
                    text: "b".into(),
                    sender: "Claude".into(),
                },
            ],
            &personas,
        );
        assert_eq!(window[0].speaker(), &Speaker::Persona(PersonaId::Analyst));
        assert_eq!(window[1].speaker(), &Speaker::User);
        assert_eq!(window[1].sequence(), 5);
    }
}
