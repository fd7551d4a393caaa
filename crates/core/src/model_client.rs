use std::pin::Pin;
use std::sync::Arc;

use backoff::backoff::Backoff;
use palaver_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::sleep;
use tracing::Instrument;

use crate::RetryPolicy;

type SendRequestResult = Result<ModelResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// Outcome of one exchange with the provider, after retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Generation {
    Success(String),
    Failure(ErrorKind),
}

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub(crate) struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending {} turns", req.messages.len());
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn ModelProviderError>
                    })
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a single request, without retrying.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }

    /// Runs one exchange, retrying throttled attempts as `policy` allows.
    ///
    /// Never fails: every terminal error is reported as
    /// [`Generation::Failure`].
    pub async fn generate(
        &self,
        req: ModelRequest,
        policy: &RetryPolicy,
    ) -> Generation {
        let mut schedule = policy.backoff();
        let mut attempt = 1;
        loop {
            let err = match self.send_request(req.clone()).await {
                Ok(resp) => {
                    trace!("attempt {attempt} succeeded");
                    return Generation::Success(resp.text);
                }
                Err(err) => err,
            };

            let kind = err.kind();
            if !kind.is_retryable() {
                error!("request failed: {err}");
                return Generation::Failure(kind);
            }
            if attempt >= policy.max_attempts() {
                error!("still rate limited after {attempt} attempts: {err}");
                return Generation::Failure(kind);
            }

            // Advance the schedule even when the provider gives a hint, so
            // that later waits keep growing with the attempt number.
            let computed = schedule.next_backoff();
            let delay = err
                .retry_after()
                .map(|hint| hint.min(policy.max_delay()))
                .or(computed)
                .unwrap_or(policy.initial_delay());
            warn!(
                "rate limited, retry {}/{} after {}ms",
                attempt + 1,
                policy.max_attempts(),
                delay.as_millis()
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
