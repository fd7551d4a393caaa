//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use palaver_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::{Instant, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
    retry_after: Option<Duration>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

/// A request the provider has received, and when.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub request: ModelRequest,
    pub at: Instant,
}

#[derive(Default)]
struct Script {
    steps: Vec<PresetResponse>,
    cursor: usize,
    failed_attempts: u64,
    calls: Vec<RecordedCall>,
}

impl Script {
    fn next_outcome(&mut self) -> Result<String, Error> {
        let Some(step) = self.steps.get(self.cursor) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::MalformedResponse,
                retry_after: None,
            });
        };

        let should_fail = match step.failures {
            Some(0) => true,
            Some(n) => self.failed_attempts < n,
            None => false,
        };
        if should_fail {
            self.failed_attempts += 1;
            return Err(Error {
                message: "injected failure",
                kind: step.failure_kind,
                retry_after: step.retry_after,
            });
        }

        let text = step.text.clone();
        self.cursor += 1;
        self.failed_attempts = 0;
        Ok(text)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each exchange. Every exchange consumes one step
/// once it succeeds; injected failures keep the script on the same step so
/// that retries see them. If there are no enough steps in the script, an
/// error will be returned.
///
/// Clones share the same script and call log, so a test can keep a clone
/// around to inspect the calls after handing the provider off.
///
/// # Note
///
/// This type is not optimized for production use, every request is copied
/// into the call log. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script().steps.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far.
    #[inline]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    #[inline]
    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the log from the others.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let outcome = {
            let mut script = self.script();
            script.calls.push(RecordedCall {
                request: req.clone(),
                at: Instant::now(),
            });
            script.next_outcome()
        };
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            outcome.map(ModelResponse::new)
        }
    }
}
