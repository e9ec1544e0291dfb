//! Document input: uploaded paragraphs and linked documents.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::errors::{DocError, Service};

/// Joins externally parsed paragraphs into one text blob.
#[must_use]
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Downloads a linked document and treats its body as plain text.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    http: Client,
}

impl DocumentFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DocError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DocError::ServiceUnavailable {
                service: Service::DocumentLink,
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    /// # Errors
    ///
    /// - `InvalidInput` for anything but an absolute http(s) URL
    /// - `FetchError` when the server answers with a status other than 200
    /// - `ServiceUnavailable` on transport failures
    pub async fn fetch(&self, link: &str) -> Result<String, DocError> {
        let url = Url::parse(link.trim())
            .map_err(|e| DocError::InvalidInput(format!("document link: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocError::InvalidInput(format!(
                "document link must use http or https, got {}",
                url.scheme()
            )));
        }

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DocError::ServiceUnavailable {
                service: Service::DocumentLink,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "Document link returned non-200");
            return Err(DocError::FetchError {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocError::ServiceUnavailable {
                service: Service::DocumentLink,
                reason: format!("Failed to read body: {e}"),
            })?;
        info!(%url, bytes = body.len(), "Fetched linked document");
        Ok(body)
    }
}
