use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, trace};

use crate::config::StoryApiConfig;
use crate::error::{parse_error_message, StoryApiError};
use crate::events::{StoryStreamEvent, StreamCompletion};
use crate::headers::build_headers;
use crate::payload::StoryRequest;
use crate::sse::SseFrameDecoder;
use crate::url::normalize_story_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Upper bound on reading a rejected response's body, independent of the idle timeout.
const ERROR_BODY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct StoryApiClient {
    http: Client,
    config: StoryApiConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<StoryStreamEvent>,
    pub completion: StreamCompletion,
}

impl StoryApiClient {
    pub fn new(config: StoryApiConfig) -> Result<Self, StoryApiError> {
        let http = Client::builder()
            .connect_timeout(config.idle_timeout)
            .build()
            .map_err(StoryApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StoryApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_story_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, StoryApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config, user_agent) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    StoryApiError::InvalidRequest(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    StoryApiError::InvalidRequest(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Build the POST without sending it. Fails before any I/O when the
    /// endpoint is not a valid URL or the body does not serialize.
    pub fn build_request(
        &self,
        request: &StoryRequest,
    ) -> Result<reqwest::RequestBuilder, StoryApiError> {
        let endpoint = self.normalized_endpoint();
        let url = Url::parse(&endpoint).map_err(|error| {
            StoryApiError::InvalidRequest(format!("invalid endpoint '{endpoint}': {error}"))
        })?;
        let body = serde_json::to_vec(request).map_err(|error| {
            StoryApiError::InvalidRequest(format!("story request does not serialize: {error}"))
        })?;
        let headers = self.build_headers(None)?;

        Ok(self.http.post(url).headers(headers).body(body))
    }

    /// Send the request and return the response once its head arrived with `200`.
    pub async fn open(
        &self,
        request: &StoryRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, StoryApiError> {
        if is_cancelled(cancellation) {
            return Err(StoryApiError::Cancelled);
        }

        let builder = self.build_request(request)?;
        debug!(endpoint = %self.normalized_endpoint(), "POST story request");

        let idle = self.config.idle_timeout;
        let response = await_or_cancel(with_idle_timeout(builder.send(), idle), cancellation)
            .await??
            .map_err(StoryApiError::from)?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }

        let body = read_error_body(response, cancellation).await?;
        let message = parse_error_message(status, &body);
        debug!(status = status.as_u16(), %message, "story request rejected");
        Err(StoryApiError::ServerError { status, message })
    }

    /// Stream one story, handing each `Chunk` and the final `Done` to `on_event`.
    ///
    /// An `Error` frame ends the stream with [`StoryApiError::ServerMessage`]
    /// and is not passed to the handler. A body that ends without `[DONE]`
    /// still produces `Done` and reports [`StreamCompletion::ConnectionClosed`].
    pub async fn stream_with_handler<F>(
        &self,
        request: &StoryRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<StreamCompletion, StoryApiError>
    where
        F: FnMut(StoryStreamEvent),
    {
        let response = self.open(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut decoder = SseFrameDecoder::default();
        let idle = self.config.idle_timeout;

        loop {
            let Some(chunk) =
                await_or_cancel(with_idle_timeout(bytes.next(), idle), cancellation).await??
            else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(StoryApiError::Cancelled);
            }
            let chunk = chunk.map_err(StoryApiError::from)?;
            trace!(len = chunk.len(), "story bytes received");

            for event in decoder.feed(&chunk) {
                if let Some(completion) = process_stream_event(event, &mut on_event)? {
                    debug!(completion = completion.as_str(), "story stream finished");
                    return Ok(completion);
                }
            }
        }

        if is_cancelled(cancellation) {
            return Err(StoryApiError::Cancelled);
        }

        debug!(
            completion = StreamCompletion::ConnectionClosed.as_str(),
            "story stream finished"
        );
        on_event(StoryStreamEvent::Done);
        Ok(StreamCompletion::ConnectionClosed)
    }

    pub async fn stream(
        &self,
        request: &StoryRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, StoryApiError> {
        let mut events = Vec::new();
        let completion = self
            .stream_with_handler(request, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, completion })
    }
}

fn process_stream_event<F>(
    event: StoryStreamEvent,
    on_event: &mut F,
) -> Result<Option<StreamCompletion>, StoryApiError>
where
    F: FnMut(StoryStreamEvent),
{
    match event {
        StoryStreamEvent::Error { message } => Err(StoryApiError::ServerMessage(message)),
        StoryStreamEvent::Done => {
            on_event(StoryStreamEvent::Done);
            Ok(Some(StreamCompletion::Explicit))
        }
        chunk @ StoryStreamEvent::Chunk { .. } => {
            on_event(chunk);
            Ok(None)
        }
    }
}

/// Collect whatever body arrives within [`ERROR_BODY_TIMEOUT`]. A body that
/// stays open or breaks keeps the bytes received so far.
async fn read_error_body(
    response: Response,
    cancellation: Option<&CancellationSignal>,
) -> Result<String, StoryApiError> {
    let deadline = tokio::time::Instant::now() + ERROR_BODY_TIMEOUT;
    let mut bytes = response.bytes_stream();
    let mut body = Vec::new();

    loop {
        let next = tokio::time::timeout_at(deadline, bytes.next());
        match await_or_cancel(next, cancellation).await? {
            Ok(Some(Ok(chunk))) => body.extend_from_slice(&chunk),
            Ok(Some(Err(error))) => {
                trace!(%error, "error body interrupted");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                trace!(received = body.len(), "error body still open; giving up");
                break;
            }
        }
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn with_idle_timeout<F>(future: F, idle: Duration) -> Result<F::Output, StoryApiError>
where
    F: Future,
{
    tokio::time::timeout(idle, future)
        .await
        .map_err(|_| StoryApiError::Timeout { idle })
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, StoryApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(StoryApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(StoryApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
