use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

/// How throttled requests are retried.
///
/// The wait after the `n`-th failed attempt is
/// `initial_delay × backoff_multiplier^(n-1)`, or the provider's retry
/// hint when it sent one. Either is capped at `max_delay`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is at least 1 and the multiplier
    /// at least 1.0; smaller values are clamped.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        // NaN compares false and is clamped too.
        let backoff_multiplier = if backoff_multiplier >= 1.0 {
            backoff_multiplier
        } else {
            1.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier,
            max_delay: Duration::from_secs(300),
        }
    }

    /// Caps a single wait, including one asked for by the provider.
    #[inline]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Total number of attempts, including the first one.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The wait after the first failed attempt.
    #[inline]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Growth factor between consecutive waits.
    #[inline]
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Upper bound of a single wait, computed or hinted.
    #[inline]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// A fresh delay schedule for one request.
    pub(crate) fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_multiplier(self.backoff_multiplier)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max_delay.max(self.initial_delay))
            .with_max_elapsed_time(None)
            .build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}
