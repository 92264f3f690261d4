use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_STORY_BASE_URL;

/// Inactivity bound applied while waiting for the response head and between body reads.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport configuration for story generation requests.
#[derive(Debug, Clone)]
pub struct StoryApiConfig {
    /// Base URL for the story backend.
    pub base_url: String,
    /// Maximum silence tolerated on the connection before failing with a timeout.
    pub idle_timeout: Duration,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for StoryApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORY_BASE_URL.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl StoryApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}
