//! Story creation allowance.
//!
//! Free users get [`FREE_STORY_LIMIT`] stories per rolling seven days,
//! subscribers [`SUBSCRIBED_STORY_LIMIT`] per calendar month (UTC). The count
//! restarts whenever the period lapses or the subscription status changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::StoryLibraryError;

pub const FREE_STORY_LIMIT: u32 = 5;
pub const SUBSCRIBED_STORY_LIMIT: u32 = 120;
pub const FREE_PERIOD: Duration = Duration::days(7);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryQuota {
    subscribed: bool,
    used: u32,
    period_start: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuotaFile {
    subscribed: bool,
    used: u32,
    period_start: String,
}

impl StoryQuota {
    #[must_use]
    pub fn new(subscribed: bool, now: OffsetDateTime) -> Self {
        Self {
            subscribed,
            used: 0,
            period_start: now,
        }
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        if self.subscribed {
            SUBSCRIBED_STORY_LIMIT
        } else {
            FREE_STORY_LIMIT
        }
    }

    #[must_use]
    pub fn used(&self) -> u32 {
        self.used
    }

    #[must_use]
    pub fn period_start(&self) -> OffsetDateTime {
        self.period_start
    }

    #[must_use]
    pub fn remaining(&self, now: OffsetDateTime) -> u32 {
        if self.period_elapsed(now) {
            self.limit()
        } else {
            self.limit().saturating_sub(self.used)
        }
    }

    #[must_use]
    pub fn can_create(&self, now: OffsetDateTime) -> bool {
        self.remaining(now) > 0
    }

    pub fn record_creation(&mut self, now: OffsetDateTime) {
        self.roll_period(now);
        self.used = self.used.saturating_add(1);
    }

    /// Switch tier. Only an actual change restarts the period.
    pub fn set_subscribed(&mut self, subscribed: bool, now: OffsetDateTime) {
        if self.subscribed == subscribed {
            return;
        }
        debug!(subscribed, "story quota tier changed");
        self.subscribed = subscribed;
        self.used = 0;
        self.period_start = now;
    }

    /// Read a quota file; a missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, StoryLibraryError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoryLibraryError::io("reading quota file", path, source)),
        };
        let file: QuotaFile =
            serde_json::from_str(&contents).map_err(|source| StoryLibraryError::QuotaParse {
                path: path.to_path_buf(),
                source,
            })?;
        let period_start = OffsetDateTime::parse(&file.period_start, &Rfc3339).map_err(|_| {
            StoryLibraryError::QuotaTimestamp {
                path: path.to_path_buf(),
                value: file.period_start.clone(),
            }
        })?;

        Ok(Some(Self {
            subscribed: file.subscribed,
            used: file.used,
            period_start,
        }))
    }

    pub fn load_or_new(path: &Path, now: OffsetDateTime) -> Result<Self, StoryLibraryError> {
        Ok(Self::load(path)?.unwrap_or_else(|| Self::new(false, now)))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoryLibraryError> {
        let file = QuotaFile {
            subscribed: self.subscribed,
            used: self.used,
            period_start: self
                .period_start
                .format(&Rfc3339)
                .map_err(StoryLibraryError::ClockFormat)?,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|source| StoryLibraryError::json_serialize(path, source))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| StoryLibraryError::io("creating quota directory", parent, source))?;
        }
        fs::write(path, json).map_err(|source| StoryLibraryError::io("writing quota file", path, source))
    }

    fn period_elapsed(&self, now: OffsetDateTime) -> bool {
        if self.subscribed {
            let start = self.period_start.to_offset(time::UtcOffset::UTC);
            let now = now.to_offset(time::UtcOffset::UTC);
            (start.year(), start.month()) != (now.year(), now.month())
        } else {
            now - self.period_start >= FREE_PERIOD
        }
    }

    fn roll_period(&mut self, now: OffsetDateTime) {
        if self.period_elapsed(now) {
            debug!("story quota period restarted");
            self.used = 0;
            self.period_start = now;
        }
    }
}
