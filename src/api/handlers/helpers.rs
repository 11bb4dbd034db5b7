use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::types::ErrorBody;
use crate::dialogue::DialogueError;

pub const INVALID_TOPIC: &str = "Invalid topic. Must be 3-100 characters and appropriate.";
pub const INVALID_MESSAGES: &str = "Invalid messages format";

pub type ApiResult<T> = Result<T, ApiError>;

/// An error response: status plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn bad_request(msg: impl Into<String>, details: Option<serde_json::Value>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorBody {
            error: msg.into(),
            details,
        },
    }
}

pub fn internal_error() -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorBody {
            error: "Internal server error".to_string(),
            details: None,
        },
    }
}

/// Upstream statuses of 400 and above are mirrored; anything else becomes 500.
pub fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .filter(|s| *s >= 400)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<DialogueError> for ApiError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::InvalidTopic(reason) => {
                bad_request(INVALID_TOPIC, Some(json!({ "reason": reason.to_string() })))
            }
            DialogueError::Upstream { status, message } => ApiError {
                status: upstream_status(status),
                body: ErrorBody {
                    error: "Upstream completion error".to_string(),
                    details: Some(json!({ "status": status, "message": message })),
                },
            },
            DialogueError::Internal(_) => internal_error(),
        }
    }
}
