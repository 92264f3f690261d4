//! Transport-only client for the story generation backend.
//!
//! This crate owns the request payload, the HTTP exchange, and the incremental
//! decoding of the streamed response body into frame-level events. It holds no
//! presentation state: throttling, title/body derivation, and lifecycle
//! tracking live in the consuming `story_stream` crate.
//!
//! Wire contract: `POST <endpoint>` with a JSON [`StoryRequest`] body. A `200`
//! response carries UTF-8 frames separated by a blank line:
//!
//! ```text
//! data: {"text": "<fragment>"}
//!
//! data: {"error": "<message>"}
//!
//! data: [DONE]
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, StoryApiClient, StreamResult};
pub use config::StoryApiConfig;
pub use error::StoryApiError;
pub use events::{StoryStreamEvent, StreamCompletion};
pub use payload::{
    Character, CharacterSubtype, ChildAge, Lesson, Place, StoryLength, StoryRequest,
    StoryRequestBuilder, StoryRequestError, DEFAULT_LANGUAGE,
};
pub use sse::SseFrameDecoder;
pub use url::normalize_story_url;
