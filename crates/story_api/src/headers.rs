use std::collections::BTreeMap;

use crate::config::StoryApiConfig;

pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_ACCEPT_CHARSET: &str = "accept-charset";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Build a deterministic header map for story requests.
///
/// Extra headers are applied last and may override the defaults; keys are
/// lowercased so overrides collapse onto the same entry.
pub fn build_headers(config: &StoryApiConfig, user_agent: Option<&str>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_CONTENT_TYPE.to_owned(), JSON_CONTENT_TYPE.to_owned());
    headers.insert(HEADER_ACCEPT_CHARSET.to_owned(), "utf-8".to_owned());

    let ua = match (user_agent, config.user_agent.as_deref()) {
        (Some(explicit), _) if !explicit.trim().is_empty() => Some(explicit.trim().to_owned()),
        (None, Some(explicit)) if !explicit.trim().is_empty() => Some(explicit.trim().to_owned()),
        _ => None,
    };
    if let Some(ua) = ua {
        headers.insert(HEADER_USER_AGENT.to_owned(), ua);
    }

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    headers
}
