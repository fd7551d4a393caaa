//! A model provider for the Gemini `generateContent` API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use palaver_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use reqwest::{Client, StatusCode, Url, header};

pub use config::{API_KEY_VARS, GeminiConfig, GeminiConfigBuilder};

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    retry_after: Option<Duration>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            retry_after: None,
        }
    }

    /// Builds the error for a non-success response.
    fn from_status(
        status: StatusCode,
        retry_after_header: Option<Duration>,
        body: &str,
    ) -> Self {
        let error_body = proto::parse_error_body(body);
        let detail = error_body
            .as_ref()
            .and_then(|b| b.message.as_deref())
            .unwrap_or("Unknown error");
        let message =
            format!("request failed with status {}: {detail}", status.as_u16());

        let kind = match status {
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ErrorKind::Unauthorized
            }
            _ => ErrorKind::MalformedResponse,
        };
        let retry_after = if kind == ErrorKind::RateLimited {
            retry_after_header
                .or_else(|| error_body.as_ref().and_then(|b| b.retry_delay()))
        } else {
            None
        };

        Self {
            message,
            kind,
            retry_after,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
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

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let payload = proto::create_request(req);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            let Some(api_key) = config.api_key.as_deref() else {
                return Err(Error::new(
                    "no API key configured",
                    ErrorKind::ConfigurationMissing,
                ));
            };
            let url =
                Url::parse_with_params(&config.endpoint(), [("key", api_key)])
                    .map_err(|err| {
                        Error::new(
                            format!("invalid endpoint: {err}"),
                            ErrorKind::ConfigurationMissing,
                        )
                    })?;

            let resp = client
                .post(url)
                .header(header::CONTENT_TYPE, "application/json")
                .json(&payload)
                .send()
                .await
                .map_err(|err| {
                    // The URL carries the key, keep it out of the message.
                    Error::new(
                        format!("{}", err.without_url()),
                        ErrorKind::NetworkFailure,
                    )
                })?;

            let status = resp.status();
            if !status.is_success() {
                let retry_after = resp
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(proto::parse_retry_after_header);
                let body = resp.text().await.unwrap_or_default();
                let err = Error::from_status(status, retry_after, &body);
                warn!("API response error: {}", err.message);
                return Err(err);
            }

            let body = resp.text().await.map_err(|err| {
                Error::new(
                    format!("{}", err.without_url()),
                    ErrorKind::MalformedResponse,
                )
            })?;
            trace!("got response body: {body}");
            match proto::extract_text(&body) {
                Some(text) => Ok(ModelResponse::new(text)),
                None => {
                    warn!("unexpected response structure or no content");
                    Err(Error::new(
                        "response carries no candidate text",
                        ErrorKind::MalformedResponse,
                    ))
                }
            }
        }
    }
}
