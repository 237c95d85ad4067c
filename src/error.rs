//! Error types for the custom provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while configuring the provider or managing resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is misconfigured (missing URL or API key, or not configured yet).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request never produced a response (connection failure, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an unexpected status code.
    ///
    /// `body` holds the raw response body as returned by the backend.
    #[error("API request failed with status {status}: {body}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A JSON payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),
}

impl ProviderError {
    /// Get the error detail as a string.
    ///
    /// For [`ProviderError::Api`] this is the raw response body.
    pub fn message(&self) -> String {
        match self {
            Self::Configuration(msg) => msg.clone(),
            Self::Transport(err) => err.to_string(),
            Self::Api { body, .. } => body.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(msg) => msg.clone(),
            Self::UnknownResource(msg) => msg.clone(),
        }
    }

    /// The HTTP status code, if the backend responded with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short summary used when reporting this error as a diagnostic.
    fn summary(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Unable to create client",
            Self::Transport(_) => "Unable to reach API",
            Self::Api { .. } => "API request failed",
            Self::Serialization(_) => "Invalid JSON payload",
            Self::Validation(_) => "Invalid configuration",
            Self::NotFound(_) => "Resource not found",
            Self::UnknownResource(_) => "Unknown resource type",
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::error(err.summary()).with_detail(err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("r-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: r-123");

        let err = ProviderError::Configuration("base URL cannot be empty".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: base URL cannot be empty"
        );

        let err = ProviderError::UnknownResource("other_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: other_resource");
    }

    #[test]
    fn test_api_error_carries_raw_body() {
        let err = ProviderError::Api {
            status: 500,
            body: r#"{"error":"internal"}"#.to_string(),
        };
        assert_eq!(err.message(), r#"{"error":"internal"}"#);
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            format!("{}", err),
            r#"API request failed with status 500: {"error":"internal"}"#
        );
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ProviderError::Serialization(_)));
        assert!(err.status().is_none());
    }

    #[test]
    fn test_error_to_diagnostic() {
        let diag: Diagnostic = ProviderError::Configuration("API key cannot be empty".into()).into();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "Unable to create client");
        assert_eq!(diag.detail, Some("API key cannot be empty".to_string()));

        let diag: Diagnostic = ProviderError::Api {
            status: 409,
            body: "conflict".into(),
        }
        .into();
        assert_eq!(diag.summary, "API request failed");
        assert_eq!(diag.detail, Some("conflict".to_string()));
    }
}
