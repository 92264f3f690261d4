//! Interfaces the story-telling flow depends on but does not own.
//!
//! Implementations are injected into [`crate::StoryTellingController`];
//! [`crate::local`] provides the on-disk ones used by the CLI.

use story_api::{StoryRequest, StoryRequestBuilder, DEFAULT_LANGUAGE};

pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the identity and locale fields embedded in every request.
pub trait IdentityProvider: Send + Sync {
    fn user_id(&self) -> Option<String>;
    fn country_code(&self) -> Option<String>;
    fn language(&self) -> String;
}

/// Fill identity fields on `builder` from `identity`.
pub fn apply_identity(
    mut builder: StoryRequestBuilder,
    identity: &dyn IdentityProvider,
) -> StoryRequestBuilder {
    builder = builder.language(identity.language());
    if let Some(user_id) = identity.user_id() {
        builder = builder.user_id(user_id);
    }
    if let Some(country_code) = identity.country_code() {
        builder = builder.country_code(country_code);
    }
    builder
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    user_id: Option<String>,
    country_code: Option<String>,
    language: String,
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self {
            user_id: None,
            country_code: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl StaticIdentity {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl IdentityProvider for StaticIdentity {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn country_code(&self) -> Option<String> {
        self.country_code.clone()
    }

    fn language(&self) -> String {
        self.language.clone()
    }
}

/// A completed story handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedStory {
    pub title: String,
    pub body: String,
    pub text: String,
    pub request: StoryRequest,
}

pub trait StoryPersistence: Send + Sync {
    /// Store `story` and return its identifier.
    fn save(&self, story: &FinishedStory) -> Result<String, CollaboratorError>;
}

/// Decides whether another story may be created.
pub trait StoryEntitlement: Send + Sync {
    fn can_create_story(&self) -> bool;
    fn record_story_creation(&self) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use story_api::{Character, ChildAge, Lesson, Place, StoryLength, StoryRequest};

    use super::{apply_identity, StaticIdentity};

    #[test]
    fn identity_fields_land_on_the_request() {
        let identity = StaticIdentity::default()
            .with_user_id("user-1")
            .with_country_code("ES")
            .with_language("Spanish");
        let builder = StoryRequest::builder()
            .child_age(ChildAge::FiveToSeven)
            .length(StoryLength::Medium)
            .place(Place::Sea)
            .lesson(Lesson::Hope)
            .character(Character::Princess);

        let request = apply_identity(builder, &identity)
            .build()
            .expect("request should build");

        assert_eq!(request.user_id(), Some("user-1"));
        assert_eq!(request.country_code(), Some("ES"));
        assert_eq!(request.language(), "Spanish");
    }

    #[test]
    fn default_identity_is_anonymous_english() {
        let identity = StaticIdentity::default();
        let request = apply_identity(
            StoryRequest::builder()
                .child_age(ChildAge::OneToThree)
                .length(StoryLength::Short)
                .place(Place::House)
                .lesson(Lesson::Love)
                .character(Character::Kings),
            &identity,
        )
        .build()
        .expect("request should build");

        assert_eq!(request.user_id(), None);
        assert_eq!(request.country_code(), None);
        assert_eq!(request.language(), "English");
    }
}
