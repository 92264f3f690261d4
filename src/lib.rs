//! Consumer-side core of the story streaming client.
//!
//! [`StreamAssembler`] is the session state machine: it buffers incoming
//! chunks, flushes them into the story text on a fixed interval, derives the
//! title and body, and tracks `Idle -> Loading -> Streaming -> Finished` or
//! `Failed`. [`StoryStreamer`] drives it from a [`StoryTransport`] on Tokio and
//! publishes [`StoryView`] snapshots. [`StoryTellingController`] adds the
//! entitlement check and saving on top.

pub mod assembler;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod derive;
pub mod local;
pub mod logging;
pub mod streamer;
pub mod transport;

pub use assembler::{
    AssemblerConfig, FailureReason, StoryView, StreamAssembler, StreamState,
    DEFAULT_FLUSH_INTERVAL,
};
pub use collaborators::{
    apply_identity, CollaboratorError, FinishedStory, IdentityProvider, StaticIdentity,
    StoryEntitlement, StoryPersistence,
};
pub use config::EnvConfig;
pub use controller::{Collaborators, ControllerError, StoryTellingController};
pub use derive::{derive_body, derive_title, DerivedView};
pub use local::{LibraryPersistence, QuotaGate};
pub use streamer::StoryStreamer;
pub use transport::StoryTransport;
