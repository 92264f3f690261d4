//! Story creation flow on top of [`StoryStreamer`].

use std::sync::Arc;

use story_api::{StoryRequest, StoryRequestBuilder, StoryRequestError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::assembler::{AssemblerConfig, StoryView};
use crate::collaborators::{
    apply_identity, CollaboratorError, FinishedStory, IdentityProvider, StoryEntitlement,
    StoryPersistence,
};
use crate::streamer::StoryStreamer;
use crate::transport::StoryTransport;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("story limit reached")]
    LimitReached,

    #[error("story is not finished")]
    NotFinished,

    #[error("story was already saved")]
    AlreadySaved,

    #[error(transparent)]
    Request(#[from] StoryRequestError),

    #[error("failed to record story creation: {0}")]
    Entitlement(#[source] CollaboratorError),

    #[error("failed to save story: {0}")]
    Persistence(#[source] CollaboratorError),
}

pub struct Collaborators {
    pub identity: Arc<dyn IdentityProvider>,
    pub persistence: Arc<dyn StoryPersistence>,
    pub entitlement: Arc<dyn StoryEntitlement>,
}

pub struct StoryTellingController {
    streamer: StoryStreamer,
    collaborators: Collaborators,
    request: Option<StoryRequest>,
    saved_id: Option<String>,
}

impl StoryTellingController {
    pub fn new(
        transport: Arc<dyn StoryTransport>,
        config: AssemblerConfig,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            streamer: StoryStreamer::new(transport, config),
            collaborators,
            request: None,
            saved_id: None,
        }
    }

    /// Fill identity fields from the injected provider and validate.
    pub fn prepare(&self, builder: StoryRequestBuilder) -> Result<StoryRequest, ControllerError> {
        Ok(apply_identity(builder, self.collaborators.identity.as_ref()).build()?)
    }

    /// Start a new story if the entitlement gate allows it.
    pub fn begin(&mut self, request: StoryRequest) -> Result<(), ControllerError> {
        let entitlement = &self.collaborators.entitlement;
        if !entitlement.can_create_story() {
            info!("story creation refused by quota");
            return Err(ControllerError::LimitReached);
        }
        entitlement
            .record_story_creation()
            .map_err(ControllerError::Entitlement)?;

        self.saved_id = None;
        self.request = Some(request.clone());
        self.streamer.start(request);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.streamer.cancel();
    }

    pub fn view(&self) -> StoryView {
        self.streamer.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoryView> {
        self.streamer.subscribe()
    }

    pub async fn wait(&mut self) -> StoryView {
        self.streamer.wait().await
    }

    pub fn request(&self) -> Option<&StoryRequest> {
        self.request.as_ref()
    }

    pub fn saved_id(&self) -> Option<&str> {
        self.saved_id.as_deref()
    }

    /// Persist the finished story. Succeeds at most once per session.
    pub fn save(&mut self) -> Result<String, ControllerError> {
        if self.saved_id.is_some() {
            return Err(ControllerError::AlreadySaved);
        }
        let view = self.streamer.view();
        if !view.is_finished() || view.cancelled {
            return Err(ControllerError::NotFinished);
        }
        let request = self.request.clone().ok_or(ControllerError::NotFinished)?;

        let story = FinishedStory {
            title: view.title,
            body: view.body,
            text: view.raw_text,
            request,
        };
        let id = self
            .collaborators
            .persistence
            .save(&story)
            .map_err(ControllerError::Persistence)?;
        debug!(%id, "story persisted");
        self.saved_id = Some(id.clone());
        Ok(id)
    }
}
