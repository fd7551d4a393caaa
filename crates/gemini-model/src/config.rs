use std::env;
use std::fmt::Debug;

/// Environment variables consulted by [`GeminiConfigBuilder::from_env`],
/// in order of precedence.
pub const API_KEY_VARS: [&str; 3] =
    ["PALAVER_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Builder for [`GeminiConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Creates a builder whose API key is taken from the first non-empty
    /// variable in [`API_KEY_VARS`].
    ///
    /// A missing key is not an error here. The provider reports it when
    /// a request is attempted.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty());
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl GeminiConfig {
    /// Returns `true` if an API key is present.
    #[inline]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The `generateContent` URL, without the key parameter.
    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfigBuilder::with_api_key("k").build();
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let config = GeminiConfigBuilder::with_api_key("k")
            .with_base_url("http://localhost:8080/")
            .with_model("gemini-1.5-pro")
            .build();
        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_key_lookup_order() {
        let vars = HashMap::from([
            ("PALAVER_API_KEY", "  "),
            ("GEMINI_API_KEY", "from-gemini"),
            ("GOOGLE_API_KEY", "from-google"),
        ]);
        let config = GeminiConfigBuilder::from_lookup(|name| {
            vars.get(name).map(|v| v.to_string())
        })
        .build();
        assert_eq!(config.api_key.as_deref(), Some("from-gemini"));
    }

    #[test]
    fn test_missing_key() {
        let config = GeminiConfigBuilder::from_lookup(|_| None).build();
        assert!(!config.has_api_key());

        let config = GeminiConfigBuilder::with_api_key("").build();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfigBuilder::with_api_key("secret").build();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
