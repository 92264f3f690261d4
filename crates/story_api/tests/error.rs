use std::time::Duration;

use reqwest::StatusCode;

use story_api::error::parse_error_message;
use story_api::StoryApiError;

#[test]
fn parse_error_message_reads_string_error_field() {
    let body = r#"{"error":"model overloaded"}"#;
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, body);
    assert_eq!(message, "model overloaded");
}

#[test]
fn parse_error_message_reads_nested_error_message() {
    let body = r#"{"error":{"code":"bad_request","message":"missing lesson"}}"#;
    let message = parse_error_message(StatusCode::BAD_REQUEST, body);
    assert_eq!(message, "missing lesson");
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let body = "raw failure text";
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, body);
    assert_eq!(message, "raw failure text");
}

#[test]
fn parse_error_message_uses_canonical_reason_for_empty_body() {
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
    assert_eq!(message, "Internal Server Error");
}

#[test]
fn server_error_display_carries_status_code() {
    let error = StoryApiError::ServerError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "boom".to_string(),
    };
    assert_eq!(error.to_string(), "server error: 500");
    assert_eq!(error.status_code(), Some(500));
}

#[test]
fn server_message_display_is_verbatim() {
    let error = StoryApiError::ServerMessage("the dragon ate the story".to_string());
    assert_eq!(error.to_string(), "the dragon ate the story");
    assert_eq!(error.status_code(), None);
}

#[test]
fn timeout_display_names_idle_window() {
    let error = StoryApiError::Timeout {
        idle: Duration::from_secs(60),
    };
    assert_eq!(error.to_string(), "no data received for 60 seconds");
}
