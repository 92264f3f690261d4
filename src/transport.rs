use futures_util::future::BoxFuture;
use story_api::{
    CancellationSignal, StoryApiClient, StoryApiError, StoryRequest, StoryStreamEvent,
    StreamCompletion,
};

/// One streaming exchange per call. Events must be delivered in arrival order
/// and the call must return promptly once `cancellation` is set.
pub trait StoryTransport: Send + Sync {
    fn stream<'a>(
        &'a self,
        request: &'a StoryRequest,
        cancellation: &'a CancellationSignal,
        on_event: &'a mut (dyn FnMut(StoryStreamEvent) + Send),
    ) -> BoxFuture<'a, Result<StreamCompletion, StoryApiError>>;
}

impl StoryTransport for StoryApiClient {
    fn stream<'a>(
        &'a self,
        request: &'a StoryRequest,
        cancellation: &'a CancellationSignal,
        on_event: &'a mut (dyn FnMut(StoryStreamEvent) + Send),
    ) -> BoxFuture<'a, Result<StreamCompletion, StoryApiError>> {
        Box::pin(self.stream_with_handler(request, Some(cancellation), on_event))
    }
}
