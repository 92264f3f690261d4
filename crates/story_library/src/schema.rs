use serde::{Deserialize, Serialize};
use story_api::StoryRequest;

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryRecordType {
    Story,
}

/// Request options a saved story was generated from, as wire strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSummary {
    pub age: String,
    pub duration: String,
    pub place: String,
    pub lesson: String,
    pub characters: Vec<String>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
}

impl RequestSummary {
    #[must_use]
    pub fn from_request(request: &StoryRequest) -> Self {
        Self {
            age: request.child_age().as_str().to_string(),
            duration: request.length().as_str().to_string(),
            place: request.place().as_str().to_string(),
            lesson: request.lesson().as_str().to_string(),
            characters: request
                .characters()
                .iter()
                .map(|character| character.as_str().to_string())
                .collect(),
            language: request.language().to_string(),
            character_name: request.character_name().map(str::to_string),
        }
    }
}

/// A story about to be saved; id and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub body: String,
    pub text: String,
    pub request: RequestSummary,
}

/// One line of the library file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedStory {
    #[serde(rename = "type")]
    pub record_type: StoryRecordType,
    pub version: u32,
    pub id: String,
    pub created_at: String,
    pub title: String,
    pub body: String,
    pub text: String,
    pub request: RequestSummary,
}

impl SavedStory {
    #[must_use]
    pub fn v1(id: impl Into<String>, created_at: impl Into<String>, draft: StoryDraft) -> Self {
        Self {
            record_type: StoryRecordType::Story,
            version: RECORD_VERSION,
            id: id.into(),
            created_at: created_at.into(),
            title: draft.title,
            body: draft.body,
            text: draft.text,
            request: draft.request,
        }
    }
}
