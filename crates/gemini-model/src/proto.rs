use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use palaver_model::{ModelMessage, ModelPart, ModelRequest, ModelRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<Value>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
    }
}

fn create_content(msg: &ModelMessage) -> Content {
    let role = match msg.role {
        ModelRole::User => "user",
        ModelRole::Assistant => "model",
    };
    let parts = msg
        .parts
        .iter()
        .map(|part| match part {
            ModelPart::Text(text) => Part::Text { text: text.clone() },
            ModelPart::Image(image) => Part::InlineData {
                inline_data: Blob {
                    mime_type: image.mime().essence_str().to_owned(),
                    data: BASE64.encode(image.data()),
                },
            },
        })
        .collect();
    Content { role, parts }
}

/// Pulls `candidates[0].content.parts[0].text` out of a success body.
///
/// Returns `None` when the body doesn't parse or the text is missing or
/// empty.
pub fn extract_text(body: &str) -> Option<String> {
    let resp = serde_json::from_str::<GenerateContentResponse>(body).ok()?;
    let text = resp
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text?;
    if text.is_empty() {
        return None;
    }
    Some(text)
}

/// Parses an error body. Unknown shapes yield `None`.
#[inline]
pub fn parse_error_body(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|resp| resp.error)
}

impl ErrorBody {
    /// The `retryDelay` of a `google.rpc.RetryInfo` detail, if any.
    pub fn retry_delay(&self) -> Option<Duration> {
        self.details
            .iter()
            .filter_map(|detail| detail.get("retryDelay")?.as_str())
            .find_map(parse_duration_literal)
    }
}

/// Parses protobuf duration literals such as `"13s"` or `"0.250s"`.
pub fn parse_duration_literal(s: &str) -> Option<Duration> {
    let secs = s.trim().strip_suffix('s')?.parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Parses the delay-seconds form of the `Retry-After` header. The
/// HTTP-date form is not used by this endpoint.
#[inline]
pub fn parse_retry_after_header(s: &str) -> Option<Duration> {
    s.trim().parse::<u64>().ok().map(Duration::from_secs)
}
