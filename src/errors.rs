use std::fmt;

use thiserror::Error;

/// External collaborator a request talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    TextGeneration,
    Geocoding,
    TimeZone,
    DocumentLink,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::TextGeneration => "text generation",
            Service::Geocoding => "geocoding",
            Service::TimeZone => "time zone",
            Service::DocumentLink => "document link",
        };
        f.write_str(name)
    }
}

/// Maps platform statuses documented as "may succeed if retried".
const TRANSIENT_STATUSES: [&str; 2] = ["UNKNOWN_ERROR", "OVER_QUERY_LIMIT"];

#[derive(Debug, Error)]
pub enum DocError {
    #[error("Failed to reach {service} service: {reason}")]
    ServiceUnavailable { service: Service, reason: String },

    #[error("{service} service returned status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    BadStatus {
        service: Service,
        status: String,
        message: Option<String>,
    },

    #[error("Unexpected {service} response: {reason}")]
    InvalidResponse { service: Service, reason: String },

    #[error("Failed to tokenize text: {0}")]
    TokenizationError(String),

    #[error("Failed to fetch document link (HTTP {status})")]
    FetchError { status: u16 },

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DocError {
    /// Whether re-running the whole operation could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            DocError::ServiceUnavailable { .. } | DocError::InvalidResponse { .. } => true,
            DocError::BadStatus { status, .. } => TRANSIENT_STATUSES.contains(&status.as_str()),
            _ => false,
        }
    }

    /// Short, user-facing rendition shown in place of the failed action's result.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DocError::BadStatus {
                service: Service::Geocoding,
                status,
                message,
            } => format!(
                "Could not find the location. Status: {status}, message: {}",
                message.as_deref().unwrap_or("none")
            ),
            DocError::BadStatus {
                service: Service::TimeZone,
                ..
            } => "Could not load the time zone for this location.".to_string(),
            DocError::FetchError { .. } => "Failed to load the document link.".to_string(),
            other => format!("An error occurred: {other}"),
        }
    }

    /// HTTP status the request router answers with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            DocError::InvalidInput(_) => 400,
            DocError::TokenizationError(_) => 422,
            DocError::ConfigMissing(_) => 500,
            DocError::ServiceUnavailable { .. }
            | DocError::BadStatus { .. }
            | DocError::InvalidResponse { .. }
            | DocError::FetchError { .. } => 502,
        }
    }
}
