//! Session state machine that turns transport events into a presentable view.
//!
//! `StreamAssembler` is synchronous and owns no timers. The caller supplies
//! `now` when chunks arrive and calls [`StreamAssembler::flush`] once the
//! deadline from [`StreamAssembler::flush_deadline`] passes. The async driver
//! in [`crate::streamer`] does exactly that on a single task.

use std::fmt;
use std::time::Duration;

use story_api::{StoryApiError, StoryStreamEvent};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::derive::DerivedView;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Delay between the first buffered chunk and its flush into the story text.
    pub flush_interval: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl AssemblerConfig {
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }
}

/// Why a session ended in [`StreamState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    InvalidRequest(String),
    InvalidResponse(String),
    ServerError(u16),
    ServerMessage(String),
    Transport(String),
}

impl FailureReason {
    /// Map a transport error to a failure reason. Cancellation is not a failure.
    pub fn from_api_error(error: &StoryApiError) -> Option<Self> {
        let reason = match error {
            StoryApiError::InvalidRequest(message) => Self::InvalidRequest(message.clone()),
            StoryApiError::InvalidResponse(message) => Self::InvalidResponse(message.clone()),
            StoryApiError::ServerError { status, .. } => Self::ServerError(status.as_u16()),
            StoryApiError::ServerMessage(message) => Self::ServerMessage(message.clone()),
            StoryApiError::Transport(_) | StoryApiError::Timeout { .. } => {
                Self::Transport(error.to_string())
            }
            StoryApiError::Cancelled => return None,
        };
        Some(reason)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::InvalidResponse(message) => write!(f, "invalid response: {message}"),
            Self::ServerError(code) => write!(f, "server error: {code}"),
            Self::ServerMessage(message) => f.write_str(message),
            Self::Transport(message) => write!(f, "connection failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Idle,
    Loading,
    Streaming,
    Finished,
    Failed(FailureReason),
}

impl StreamState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading | Self::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Streaming => "streaming",
            Self::Finished => "finished",
            Self::Failed(_) => "failed",
        }
    }
}

/// Snapshot of a session as the presentation layer sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryView {
    pub title: String,
    pub body: String,
    pub raw_text: String,
    pub state: StreamState,
    pub cancelled: bool,
}

impl StoryView {
    /// Frozen finished view over previously saved text.
    pub fn finished_from_text(text: impl Into<String>) -> Self {
        let raw_text = text.into();
        let derived = DerivedView::from_raw(&raw_text);
        Self {
            title: derived.title,
            body: derived.body,
            raw_text,
            state: StreamState::Finished,
            cancelled: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == StreamState::Loading
    }

    pub fn is_finished(&self) -> bool {
        self.state == StreamState::Finished
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            StreamState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }
}

/// Chunks received since the last flush, plus the flush deadline.
#[derive(Debug, Default)]
struct PendingChunkBuffer {
    text: String,
    deadline: Option<Instant>,
}

impl PendingChunkBuffer {
    /// Returns the newly scheduled deadline when this push opened a window.
    fn push(&mut self, text: &str, now: Instant, interval: Duration) -> Option<Instant> {
        self.text.push_str(text);
        if self.deadline.is_some() {
            return None;
        }
        let deadline = now + interval;
        self.deadline = Some(deadline);
        Some(deadline)
    }

    fn take(&mut self) -> String {
        self.deadline = None;
        std::mem::take(&mut self.text)
    }

    fn clear(&mut self) {
        self.text.clear();
        self.deadline = None;
    }
}

#[derive(Debug)]
pub struct StreamAssembler {
    config: AssemblerConfig,
    state: StreamState,
    raw_text: String,
    derived: DerivedView,
    pending: PendingChunkBuffer,
    appends: usize,
    cancelled: bool,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl StreamAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            state: StreamState::Idle,
            raw_text: String::new(),
            derived: DerivedView::default(),
            pending: PendingChunkBuffer::default(),
            appends: 0,
            cancelled: false,
        }
    }

    /// Begin a fresh session, discarding everything from the previous one.
    pub fn start(&mut self) {
        self.raw_text.clear();
        self.derived = DerivedView::default();
        self.pending.clear();
        self.appends = 0;
        self.cancelled = false;
        self.transition(StreamState::Loading);
    }

    /// Buffer a chunk. Returns the flush deadline if this chunk scheduled one.
    pub fn push_chunk(&mut self, text: &str, now: Instant) -> Option<Instant> {
        if !self.accepts_events() {
            return None;
        }
        trace!(len = text.len(), "story chunk buffered");
        self.pending.push(text, now, self.config.flush_interval)
    }

    /// Move buffered text into the story. Returns `false` when nothing was pending.
    pub fn flush(&mut self) -> bool {
        if !self.accepts_events() {
            return false;
        }
        let pending = self.pending.take();
        if pending.is_empty() {
            return false;
        }
        self.raw_text.push_str(&pending);
        self.appends += 1;
        self.derived = DerivedView::from_raw(&self.raw_text);
        trace!(
            appended = pending.len(),
            total = self.raw_text.len(),
            "story text flushed"
        );
        if self.state == StreamState::Loading && !self.derived.title.is_empty() {
            self.transition(StreamState::Streaming);
        }
        true
    }

    /// Flush whatever is buffered and end the session successfully.
    pub fn finish(&mut self) {
        if !self.accepts_events() {
            return;
        }
        self.flush();
        self.transition(StreamState::Finished);
    }

    /// End the session with `reason`. Text already received stays available.
    pub fn fail(&mut self, reason: FailureReason) {
        if !self.accepts_events() {
            return;
        }
        self.flush();
        self.transition(StreamState::Failed(reason));
    }

    pub fn apply(&mut self, event: StoryStreamEvent, now: Instant) {
        match event {
            StoryStreamEvent::Chunk { text } => {
                self.push_chunk(&text, now);
            }
            StoryStreamEvent::Error { message } => self.fail(FailureReason::ServerMessage(message)),
            StoryStreamEvent::Done => self.finish(),
        }
    }

    /// Freeze the session. Nothing changes afterwards until the next `start`.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.pending.clear();
        debug!(state = self.state.as_str(), "story session cancelled");
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        if self.accepts_events() {
            self.pending.deadline
        } else {
            None
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn title(&self) -> &str {
        &self.derived.title
    }

    pub fn body(&self) -> &str {
        &self.derived.body
    }

    pub fn pending_text(&self) -> &str {
        &self.pending.text
    }

    /// Number of appends to the story text in this session.
    pub fn appends(&self) -> usize {
        self.appends
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn view(&self) -> StoryView {
        StoryView {
            title: self.derived.title.clone(),
            body: self.derived.body.clone(),
            raw_text: self.raw_text.clone(),
            state: self.state.clone(),
            cancelled: self.cancelled,
        }
    }

    fn accepts_events(&self) -> bool {
        !self.cancelled && self.state.is_active()
    }

    fn transition(&mut self, next: StreamState) {
        debug!(from = self.state.as_str(), to = next.as_str(), "story state");
        self.state = next;
    }
}
