use std::time::Duration;

use palaver_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The preset outcome for one exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Text returned once the exchange succeeds.
    pub text: String,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
    /// The kind of the injected failures.
    pub failure_kind: ErrorKind,
    /// Retry hint attached to the injected failures.
    #[serde(default, with = "millis")]
    pub retry_after: Option<Duration>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` that succeeds with `text`.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            failures: None,
            failure_kind: ErrorKind::RateLimited,
            retry_after: None,
        }
    }

    /// Creates a `PresetResponse` that always fails with `kind`.
    #[inline]
    pub fn always_failing(kind: ErrorKind) -> Self {
        Self::with_text("").with_failures(0, kind)
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64, kind: ErrorKind) -> Self {
        self.failures = Some(failures);
        self.failure_kind = kind;
        self
    }

    /// Attaches a retry hint to the injected failures.
    #[inline]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_text("Karibu!")
            .with_failures(2, ErrorKind::RateLimited)
            .with_retry_after(Duration::from_millis(1500));

        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains(r#""failure_kind":"rate_limited""#));
        assert!(serialized.contains(r#""retry_after":1500"#));
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }
}
