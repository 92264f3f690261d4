use serde::{Deserialize, Serialize};

/// Frame-level event decoded from the story response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryStreamEvent {
    /// Incremental fragment of story text, possibly carrying `[...]` tags.
    Chunk { text: String },
    /// Application-level failure reported by the backend inside a frame.
    Error { message: String },
    /// End of the story, explicit `[DONE]` or connection close.
    Done,
}

impl StoryStreamEvent {
    pub fn chunk(text: impl Into<String>) -> Self {
        Self::Chunk { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// `Done` and `Error` end a stream; nothing is read after them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// How a successful stream ended.
///
/// Both variants are success: servers that close the connection without a
/// terminator still delivered a complete story as far as the client can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamCompletion {
    /// A `data: [DONE]` frame was received.
    Explicit,
    /// The body ended without a terminator frame.
    ConnectionClosed,
}

impl StreamCompletion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::ConnectionClosed => "connection_closed",
        }
    }
}
