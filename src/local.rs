//! File-backed collaborators built on `story_library`.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use story_library::{RequestSummary, StoryDraft, StoryLibrary, StoryQuota};
use time::OffsetDateTime;

use crate::collaborators::{CollaboratorError, FinishedStory, StoryEntitlement, StoryPersistence};

pub struct LibraryPersistence {
    library: Mutex<StoryLibrary>,
}

impl LibraryPersistence {
    pub fn new(library: StoryLibrary) -> Self {
        Self {
            library: Mutex::new(library),
        }
    }

    pub fn into_inner(self) -> StoryLibrary {
        self.library
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoryPersistence for LibraryPersistence {
    fn save(&self, story: &FinishedStory) -> Result<String, CollaboratorError> {
        let draft = StoryDraft {
            title: story.title.clone(),
            body: story.body.clone(),
            text: story.text.clone(),
            request: RequestSummary::from_request(&story.request),
        };
        let mut library = self.library.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = library.append(draft)?;
        Ok(saved.id)
    }
}

pub type Clock = fn() -> OffsetDateTime;

/// Quota gate that writes the updated count back to disk on every creation.
pub struct QuotaGate {
    quota: Mutex<StoryQuota>,
    path: Option<PathBuf>,
    clock: Clock,
}

impl QuotaGate {
    pub fn new(quota: StoryQuota, path: Option<PathBuf>) -> Self {
        Self {
            quota: Mutex::new(quota),
            path,
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn remaining(&self) -> u32 {
        let now = (self.clock)();
        self.quota
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining(now)
    }

    pub fn snapshot(&self) -> StoryQuota {
        self.quota
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StoryEntitlement for QuotaGate {
    fn can_create_story(&self) -> bool {
        let now = (self.clock)();
        self.quota
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .can_create(now)
    }

    fn record_story_creation(&self) -> Result<(), CollaboratorError> {
        let now = (self.clock)();
        let mut quota = self.quota.lock().unwrap_or_else(PoisonError::into_inner);
        quota.record_creation(now);
        if let Some(path) = &self.path {
            quota.save(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use story_library::{StoryQuota, FREE_STORY_LIMIT};
    use time::OffsetDateTime;

    use super::QuotaGate;
    use crate::collaborators::StoryEntitlement;

    fn fixed_now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + time::Duration::days(20_000)
    }

    #[test]
    fn gate_counts_down_and_persists() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("quota.json");
        let gate = QuotaGate::new(StoryQuota::new(false, fixed_now()), Some(path.clone()))
            .with_clock(fixed_now);

        for _ in 0..FREE_STORY_LIMIT {
            assert!(gate.can_create_story());
            gate.record_story_creation().expect("record should succeed");
        }
        assert!(!gate.can_create_story());
        assert_eq!(gate.remaining(), 0);

        let stored = StoryQuota::load(&path)
            .expect("quota should load")
            .expect("quota file exists");
        assert_eq!(stored.used(), FREE_STORY_LIMIT);
    }
}
