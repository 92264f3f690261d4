//! On-disk state for the story-telling client: saved stories, the creation
//! quota, and a stable anonymous user id.

mod error;
mod identity;
mod paths;
mod quota;
mod schema;
mod store;

pub use error::StoryLibraryError;
pub use identity::load_or_create_user_id;
pub use paths::{library_file, library_root, sibling_file, LIBRARY_FILE, QUOTA_FILE, USER_ID_FILE};
pub use quota::{StoryQuota, FREE_PERIOD, FREE_STORY_LIMIT, SUBSCRIBED_STORY_LIMIT};
pub use schema::{RequestSummary, SavedStory, StoryDraft, StoryRecordType, RECORD_VERSION};
pub use store::StoryLibrary;
