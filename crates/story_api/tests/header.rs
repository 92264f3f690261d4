use story_api::headers::{
    build_headers, HEADER_ACCEPT_CHARSET, HEADER_CONTENT_TYPE, HEADER_USER_AGENT,
};
use story_api::StoryApiConfig;

#[test]
fn header_map_contains_json_utf8_headers() {
    let config = StoryApiConfig::default().insert_header("X-Extra", " value ");

    let headers = build_headers(&config, None);
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).expect("content-type"),
        "application/json; charset=utf-8"
    );
    assert_eq!(
        headers.get(HEADER_ACCEPT_CHARSET).expect("accept-charset"),
        "utf-8"
    );
    assert_eq!(headers.get("x-extra").expect("custom"), "value");
    assert!(headers.get(HEADER_USER_AGENT).is_none());
}

#[test]
fn header_map_prefers_explicit_user_agent() {
    let config = StoryApiConfig::default().with_user_agent("configured-agent");

    let explicit = build_headers(&config, Some("test-agent"));
    assert_eq!(explicit.get(HEADER_USER_AGENT).expect("user-agent"), "test-agent");

    let configured = build_headers(&config, None);
    assert_eq!(
        configured.get(HEADER_USER_AGENT).expect("user-agent"),
        "configured-agent"
    );
}

#[test]
fn header_map_skips_blank_extra_keys() {
    let config = StoryApiConfig::default().insert_header("  ", "ignored");
    let headers = build_headers(&config, None);
    assert_eq!(headers.len(), 2);
}
