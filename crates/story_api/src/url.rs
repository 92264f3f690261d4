/// Default base URL for story generation requests.
pub const DEFAULT_STORY_BASE_URL: &str = "https://buky-smart-stories.vercel.app";

/// Path of the streaming story endpoint below the base URL.
pub const STORY_ENDPOINT_PATH: &str = "/api/hello";

/// Normalize a base URL to the streaming story endpoint.
///
/// Normalization rules:
/// 1) keep `/api/hello` unchanged
/// 2) append `/hello` when path ends in `/api`
/// 3) append `/api/hello` otherwise
pub fn normalize_story_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_STORY_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(STORY_ENDPOINT_PATH) {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/hello");
    }
    format!("{trimmed}{STORY_ENDPOINT_PATH}")
}
