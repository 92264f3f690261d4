//! Async driver for one story session at a time.
//!
//! Two tasks per session. The reader task runs the transport and forwards
//! every event over a channel. The driver task owns the [`StreamAssembler`]
//! and is the only place its state changes: it selects between incoming
//! events and the pending flush deadline, then publishes a [`StoryView`]
//! through a `watch` channel.
//!
//! Publishing happens under the watch lock and re-checks the session's
//! cancellation flag there, and [`StoryStreamer::cancel`] takes the same lock
//! after raising the flag. Once `cancel` returns, the observable view no longer
//! changes for that session. A session whose view already reached a terminal
//! state keeps it; cancelling afterwards leaves the view untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use story_api::{CancellationSignal, StoryApiError, StoryRequest, StoryStreamEvent, StreamCompletion};
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, debug_span, warn, Instrument};

use crate::assembler::{AssemblerConfig, FailureReason, StoryView, StreamAssembler, StreamState};
use crate::transport::StoryTransport;

enum TransportMessage {
    Event(StoryStreamEvent),
    Ended(Result<StreamCompletion, StoryApiError>),
}

struct ActiveSession {
    id: u64,
    cancellation: CancellationSignal,
    reader: AbortHandle,
    driver: JoinHandle<()>,
}

pub struct StoryStreamer {
    transport: Arc<dyn StoryTransport>,
    config: AssemblerConfig,
    publisher: Arc<watch::Sender<StoryView>>,
    session: Option<ActiveSession>,
    next_session_id: u64,
}

impl StoryStreamer {
    pub fn new(transport: Arc<dyn StoryTransport>, config: AssemblerConfig) -> Self {
        let (publisher, _) = watch::channel(StoryView::default());
        Self {
            transport,
            config,
            publisher: Arc::new(publisher),
            session: None,
            next_session_id: 1,
        }
    }

    /// Start a fresh session. Any running session is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, request: StoryRequest) {
        self.cancel();

        let id = self.next_session_id;
        self.next_session_id += 1;
        let cancellation: CancellationSignal = Arc::new(AtomicBool::new(false));
        self.publisher.send_replace(StoryView {
            state: StreamState::Loading,
            ..StoryView::default()
        });

        let span = debug_span!("story_session", session = id);
        let (sender, receiver) = mpsc::unbounded_channel();
        let reader = tokio::spawn(
            read_transport(
                Arc::clone(&self.transport),
                request,
                Arc::clone(&cancellation),
                sender,
            )
            .instrument(span.clone()),
        )
        .abort_handle();
        let driver = tokio::spawn(
            drive_session(
                receiver,
                reader.clone(),
                self.config,
                Arc::clone(&cancellation),
                Arc::clone(&self.publisher),
            )
            .instrument(span),
        );

        self.session = Some(ActiveSession {
            id,
            cancellation,
            reader,
            driver,
        });
    }

    /// Abandon the current session. A no-op when nothing is running.
    pub fn cancel(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.reader.abort();
        if session.driver.is_finished() {
            return;
        }

        session.cancellation.store(true, Ordering::Release);
        // Wait out any publish already holding the lock; later ones see the flag.
        self.publisher.send_if_modified(|view| {
            if view.cancelled || view.state.is_terminal() {
                false
            } else {
                view.cancelled = true;
                true
            }
        });
        session.driver.abort();
        debug!(session = session.id, "story session abandoned");
    }

    /// Latest published view.
    pub fn view(&self) -> StoryView {
        self.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoryView> {
        self.publisher.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.driver.is_finished())
    }

    /// Wait until the current session ends or is cancelled, then return its view.
    pub async fn wait(&mut self) -> StoryView {
        if let Some(session) = self.session.as_mut() {
            let _ = (&mut session.driver).await;
        }
        self.view()
    }
}

impl Drop for StoryStreamer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn drive_session(
    mut receiver: mpsc::UnboundedReceiver<TransportMessage>,
    reader: AbortHandle,
    config: AssemblerConfig,
    cancellation: CancellationSignal,
    publisher: Arc<watch::Sender<StoryView>>,
) {
    let mut assembler = StreamAssembler::new(config);
    assembler.start();
    publish(&publisher, &cancellation, &assembler);

    loop {
        let deadline = assembler.flush_deadline();
        tokio::select! {
            message = receiver.recv() => match message {
                Some(TransportMessage::Event(event)) => assembler.apply(event, Instant::now()),
                Some(TransportMessage::Ended(Ok(completion))) => {
                    debug!(completion = completion.as_str(), "story transport ended");
                    assembler.finish();
                }
                Some(TransportMessage::Ended(Err(error))) => {
                    match FailureReason::from_api_error(&error) {
                        Some(reason) => {
                            debug!(%error, "story transport failed");
                            assembler.fail(reason);
                        }
                        None => assembler.cancel(),
                    }
                }
                None => {
                    warn!("story transport task stopped without a result");
                    assembler.fail(FailureReason::Transport(
                        "stream ended unexpectedly".to_string(),
                    ));
                }
            },
            () = flush_timer(deadline) => {
                assembler.flush();
            }
        }

        if !publish(&publisher, &cancellation, &assembler) {
            break;
        }
        if assembler.state().is_terminal() || assembler.is_cancelled() {
            break;
        }
    }

    reader.abort();
}

async fn read_transport(
    transport: Arc<dyn StoryTransport>,
    request: StoryRequest,
    cancellation: CancellationSignal,
    sender: mpsc::UnboundedSender<TransportMessage>,
) {
    let events = sender.clone();
    let mut forward = move |event: StoryStreamEvent| {
        let _ = events.send(TransportMessage::Event(event));
    };
    let result = transport.stream(&request, &cancellation, &mut forward).await;
    let _ = sender.send(TransportMessage::Ended(result));
}

async fn flush_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Returns `false` once the session has been cancelled.
fn publish(
    publisher: &watch::Sender<StoryView>,
    cancellation: &CancellationSignal,
    assembler: &StreamAssembler,
) -> bool {
    let mut live = true;
    publisher.send_if_modified(|view| {
        if cancellation.load(Ordering::Acquire) {
            live = false;
            return false;
        }
        let next = assembler.view();
        if *view == next {
            return false;
        }
        *view = next;
        true
    });
    live
}
