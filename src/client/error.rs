//! Failures surfaced by the Jobs API client

use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

/// Every way a call against GitLab can fail, classified so callers can
/// tell missing resources and bad credentials apart from transport trouble.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A 2xx body that is not the expected JSON shape
    #[error("Failed to parse JSON response from {endpoint}: {message}")]
    JsonParse {
        endpoint: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other non-success status, with the message GitLab sent
    #[error("GitLab API error (HTTP {status}): {message}")]
    GitlabApi { status: u16, message: CompactString },

    /// Writing a downloaded file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration value is out of range or malformed
    #[error("Invalid {field}: {message}")]
    ConfigValidation { field: String, message: String },

    /// A request argument was rejected before sending
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Authentication,

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimit { retry_after: Option<std::time::Duration> },
}

impl ClientError {
    /// Body of a successful response that did not decode
    pub fn json_parse(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse {
            endpoint: endpoint.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a GitLab API error
    pub fn gitlab_api(status: u16, message: impl Into<CompactString>) -> Self {
        Self::GitlabApi { status, message: message.into() }
    }

    /// Create an I/O error for the given file
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after: Option<std::time::Duration>) -> Self {
        Self::RateLimit { retry_after }
    }

    /// HTTP status of the failed exchange, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::GitlabApi { status, .. } => Some(*status),
            ClientError::Authentication => Some(401),
            ClientError::NotFound { .. } => Some(404),
            ClientError::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Timeouts and connection failures; worth retrying
    pub fn is_network_error(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Result of a client call
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ClientError::config("Invalid token");
        assert!(matches!(err, ClientError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: Invalid token");
    }

    #[test]
    fn test_gitlab_api_error() {
        let err = ClientError::gitlab_api(403, "403 Forbidden");
        assert!(matches!(err, ClientError::GitlabApi { .. }));
        assert_eq!(err.to_string(), "GitLab API error (HTTP 403): 403 Forbidden");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ClientError::Authentication.status(), Some(401));
        assert_eq!(ClientError::not_found("Job 1").status(), Some(404));
        assert_eq!(ClientError::rate_limit(None).status(), Some(429));
        assert_eq!(ClientError::invalid_argument("empty").status(), None);
    }

    #[test]
    fn test_io_error_wraps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ClientError::io("/tmp/out.zip", cause);

        assert!(err.to_string().contains("/tmp/out.zip"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "denied");
    }

    #[test]
    fn test_not_found() {
        assert!(ClientError::not_found("Job 42").is_not_found());
        assert!(!ClientError::gitlab_api(500, "boom").is_not_found());
        assert!(!ClientError::Authentication.is_network_error());
    }
}
