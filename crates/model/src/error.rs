use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
///
/// Only [`ErrorKind::RateLimited`] is considered transient. Every other
/// kind is terminal for the request that produced it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider is throttling requests.
    RateLimited,
    /// The provider rejected the credentials.
    Unauthorized,
    /// The provider answered, but not with what we expected. This also
    /// covers non-success statuses without a more specific kind.
    MalformedResponse,
    /// The provider could not be reached at all.
    NetworkFailure,
    /// The provider is not configured (e.g. no API key).
    ConfigurationMissing,
}

impl ErrorKind {
    /// Returns `true` if a request failed with this kind may succeed
    /// when retried later.
    #[inline]
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited)
    }
}
