use thiserror::Error;

/// Error types that can occur when talking to a completion provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Transport failures: connection, timeout, TLS
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Missing or rejected credentials
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Invalid request parameters or format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Non-success status returned by the provider
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
    /// API response parsing or format error
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
}

impl LLMError {
    /// HTTP status associated with the failure, if the provider reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LLMError::ProviderError { status, .. } => Some(*status),
            LLMError::AuthError(_) => Some(401),
            _ => None,
        }
    }
}

/// Converts reqwest HTTP errors into LLMErrors, keeping the status when present.
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => LLMError::ProviderError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => LLMError::HttpError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_for_provider_and_auth_errors() {
        let err = LLMError::ProviderError {
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(LLMError::AuthError("missing".into()).status(), Some(401));
        assert_eq!(LLMError::HttpError("timeout".into()).status(), None);
    }

    #[test]
    fn json_errors_carry_position() {
        let err: LLMError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("line 1"));
    }
}
