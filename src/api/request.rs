//! Request payloads accepted by the API Lambda.

use serde::Deserialize;
use serde_json::Value;

use crate::core::models::{ModelChoice, OutputLanguage};
use crate::errors::DocError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DocRequest {
    Generate {
        keyword: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Summarize {
        #[serde(default)]
        text: Option<String>,
        /// Paragraphs of an uploaded document, already extracted.
        #[serde(default)]
        paragraphs: Option<Vec<String>>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Fetch {
        url: String,
    },
    Tokens {
        text: String,
    },
    Chunk {
        text: String,
        #[serde(default)]
        max_tokens: Option<usize>,
    },
    Time {
        place: String,
        #[serde(default)]
        retries: Option<u32>,
    },
}

/// Where the text to summarize comes from. An upload wins over a link, a link over raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Paragraphs(Vec<String>),
    Link(String),
    Text(String),
}

impl DocumentSource {
    /// # Errors
    ///
    /// Returns `InvalidInput` when no source is present.
    pub fn pick(
        text: Option<String>,
        paragraphs: Option<Vec<String>>,
        url: Option<String>,
    ) -> Result<Self, DocError> {
        if let Some(paragraphs) = paragraphs.filter(|p| !p.is_empty()) {
            return Ok(DocumentSource::Paragraphs(paragraphs));
        }
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            return Ok(DocumentSource::Link(url));
        }
        text.filter(|t| !t.trim().is_empty())
            .map(DocumentSource::Text)
            .ok_or_else(|| {
                DocError::InvalidInput("one of paragraphs, url or text is required".to_string())
            })
    }
}

/// Accepts either the request itself or an API Gateway envelope carrying it as `body`.
///
/// # Errors
///
/// Returns `InvalidInput` for a missing or malformed request.
pub fn parse_request(payload: &Value) -> Result<DocRequest, DocError> {
    let request_value = match payload.get("body") {
        Some(Value::String(body)) => serde_json::from_str::<Value>(body)
            .map_err(|e| DocError::InvalidInput(format!("body is not JSON: {e}")))?,
        Some(Value::Object(_)) => payload["body"].clone(),
        Some(_) => return Err(DocError::InvalidInput("Invalid body format".to_string())),
        None => payload.clone(),
    };

    serde_json::from_value(request_value)
        .map_err(|e| DocError::InvalidInput(format!("unrecognised request: {e}")))
}

/// # Errors
///
/// Returns `InvalidInput` for an unknown model name.
pub fn parse_model(raw: Option<&str>, default: ModelChoice) -> Result<ModelChoice, DocError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse().map_err(DocError::InvalidInput),
        None => Ok(default),
    }
}

/// # Errors
///
/// Returns `InvalidInput` for an unsupported language.
pub fn parse_language(raw: Option<&str>) -> Result<OutputLanguage, DocError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse().map_err(DocError::InvalidInput),
        None => Ok(OutputLanguage::default()),
    }
}
