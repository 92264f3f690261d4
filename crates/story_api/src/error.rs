use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryApiError {
    /// The endpoint or body could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response could not be interpreted as an HTTP exchange.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend answered with a status other than `200`.
    #[error("server error: {}", status.as_u16())]
    ServerError { status: StatusCode, message: String },

    /// The backend sent `data: {"error": ...}` inside the stream.
    #[error("{0}")]
    ServerMessage(String),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("no data received for {} seconds", idle.as_secs())]
    Timeout { idle: Duration },

    #[error("request was cancelled")]
    Cancelled,
}

impl StoryApiError {
    /// HTTP status for `ServerError`, `None` for every other variant.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoryApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::InvalidRequest(error.to_string())
        } else if error.is_connect() || error.is_request() || error.is_timeout() {
            Self::Transport(error)
        } else if error.is_decode() || error.is_redirect() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<Value>,
    message: Option<String>,
}

/// Extract a human-readable message from a non-success response body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else falls back to the raw body, then to the
/// canonical status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(parsed) = serde_json::from_str::<ErrorPayload>(body) else {
        return fallback();
    };

    let from_error = parsed.error.and_then(|value| match value {
        Value::String(message) => non_empty(message),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .and_then(non_empty),
        _ => None,
    });

    from_error
        .or_else(|| parsed.message.and_then(non_empty))
        .unwrap_or_else(fallback)
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
