use std::error::Error;
use std::time::Duration;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns how long the provider asked us to wait before retrying,
    /// if it said so.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// An endpoint that turns a conversation into the next assistant turn.
///
/// Callers treat a provider as stateless: every request carries the whole
/// conversation, and a provider may be dropped between requests.
pub trait ModelProvider: Send + Sync {
    /// Error returned when a request fails.
    type Error: ModelProviderError;

    /// Sends a request to the provider and waits for the complete answer.
    ///
    /// The returned future must not borrow `self`, so that callers can
    /// drive it from another task.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static;
}
