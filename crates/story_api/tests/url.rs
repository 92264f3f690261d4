use story_api::normalize_story_url;
use story_api::url::DEFAULT_STORY_BASE_URL;

#[test]
fn url_normalization_keeps_existing_story_endpoint() {
    assert_eq!(
        normalize_story_url("https://stories.example.com/api/hello"),
        "https://stories.example.com/api/hello"
    );
}

#[test]
fn url_normalization_appends_hello_to_api_base() {
    assert_eq!(
        normalize_story_url("https://stories.example.com/api/"),
        "https://stories.example.com/api/hello"
    );
}

#[test]
fn url_normalization_appends_full_path_to_generic_base() {
    assert_eq!(
        normalize_story_url("http://127.0.0.1:3000"),
        "http://127.0.0.1:3000/api/hello"
    );
}

#[test]
fn url_normalization_falls_back_to_default_base() {
    assert_eq!(
        normalize_story_url("   "),
        format!("{DEFAULT_STORY_BASE_URL}/api/hello")
    );
}
