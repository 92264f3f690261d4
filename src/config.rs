//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use story_api::StoryApiConfig;

use crate::assembler::AssemblerConfig;

pub const BASE_URL_ENV: &str = "STORY_STREAM_BASE_URL";
pub const FLUSH_MS_ENV: &str = "STORY_STREAM_FLUSH_MS";
pub const IDLE_TIMEOUT_ENV: &str = "STORY_STREAM_IDLE_TIMEOUT_SECS";
pub const LOG_ENV: &str = "STORY_STREAM_LOG";
pub const LIBRARY_PATH_ENV: &str = "STORY_STREAM_LIBRARY_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub base_url: Option<String>,
    pub flush_interval: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub log_filter: Option<String>,
    pub library_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string_opt(BASE_URL_ENV),
            flush_interval: env_u64_opt(FLUSH_MS_ENV).map(Duration::from_millis),
            idle_timeout: env_u64_opt(IDLE_TIMEOUT_ENV)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_filter: env_string_opt(LOG_ENV),
            library_path: env_string_opt(LIBRARY_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Layer the environment over `base`.
    pub fn apply_to_api(&self, mut base: StoryApiConfig) -> StoryApiConfig {
        if let Some(base_url) = &self.base_url {
            base = base.with_base_url(base_url.clone());
        }
        if let Some(idle_timeout) = self.idle_timeout {
            base = base.with_idle_timeout(idle_timeout);
        }
        base
    }

    pub fn apply_to_assembler(&self, base: AssemblerConfig) -> AssemblerConfig {
        match self.flush_interval {
            Some(flush_interval) => base.with_flush_interval(flush_interval),
            None => base,
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_u64_opt(key: &str) -> Option<u64> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{
        EnvConfig, BASE_URL_ENV, FLUSH_MS_ENV, IDLE_TIMEOUT_ENV, LIBRARY_PATH_ENV, LOG_ENV,
    };
    use crate::assembler::{AssemblerConfig, DEFAULT_FLUSH_INTERVAL};
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use story_api::StoryApiConfig;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_unset() {
        let _lock = env_lock();
        let _g1 = set_env_guard(BASE_URL_ENV, None);
        let _g2 = set_env_guard(FLUSH_MS_ENV, None);
        let _g3 = set_env_guard(IDLE_TIMEOUT_ENV, None);
        let _g4 = set_env_guard(LOG_ENV, None);
        let _g5 = set_env_guard(LIBRARY_PATH_ENV, None);

        let config = EnvConfig::from_env();
        assert_eq!(config, EnvConfig::default());
        assert_eq!(
            config.apply_to_assembler(AssemblerConfig::default()).flush_interval,
            DEFAULT_FLUSH_INTERVAL
        );
    }

    #[test]
    fn env_values_are_parsed() {
        let _lock = env_lock();
        let _g1 = set_env_guard(BASE_URL_ENV, Some("http://127.0.0.1:3000"));
        let _g2 = set_env_guard(FLUSH_MS_ENV, Some("250"));
        let _g3 = set_env_guard(IDLE_TIMEOUT_ENV, Some(" 15 "));
        let _g4 = set_env_guard(LOG_ENV, Some("story_stream=debug"));
        let _g5 = set_env_guard(LIBRARY_PATH_ENV, Some("/tmp/stories.jsonl"));

        let config = EnvConfig::from_env();
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:3000"));
        assert_eq!(config.flush_interval, Some(Duration::from_millis(250)));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.log_filter.as_deref(), Some("story_stream=debug"));
        assert_eq!(
            config.library_path,
            Some(PathBuf::from("/tmp/stories.jsonl"))
        );

        let api = config.apply_to_api(StoryApiConfig::default());
        assert_eq!(api.base_url, "http://127.0.0.1:3000");
        assert_eq!(api.idle_timeout, Duration::from_secs(15));
    }

    #[test]
    fn blank_and_unparsable_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(BASE_URL_ENV, Some("   "));
        let _g2 = set_env_guard(FLUSH_MS_ENV, Some("soon"));
        let _g3 = set_env_guard(IDLE_TIMEOUT_ENV, Some("0"));

        let config = EnvConfig::from_env();
        assert!(config.base_url.is_none());
        assert!(config.flush_interval.is_none());
        assert!(config.idle_timeout.is_none());
    }
}
