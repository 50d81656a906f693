//! Error types for the AppTrust provider.

use thiserror::Error;

use crate::api_error;
use crate::schema::Diagnostic;

/// Errors that can occur while driving AppTrust resources and data sources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested entity was not found (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists (HTTP 409).
    #[error("Resource conflict: {0}")]
    Conflict(String),

    /// The request or the local configuration failed validation (HTTP 400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were missing or rejected (HTTP 401).
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The caller is not allowed to perform the operation (HTTP 403).
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The server failed to handle the request (HTTP 500, 502, 503).
    #[error("Server error (status {status}): {message}")]
    Server {
        /// HTTP status code returned by the server.
        status: u16,
        /// Human-readable message derived from the response body.
        message: String,
    },

    /// A composite identifier could not be decoded.
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Any other unexpected status code.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Human-readable message derived from the response body.
        message: String,
    },

    /// The provider configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Conflict(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Unauthorized(msg) => msg,
            Self::Forbidden(msg) => msg,
            Self::Server { message, .. } => message,
            Self::MalformedIdentifier(msg) => msg,
            Self::Api { message, .. } => message,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Http(_err) => "HTTP error (see Debug output)",
        }
    }

    /// Map a non-2xx response onto the error taxonomy.
    ///
    /// `operation` is the verb being attempted ("create", "read", ...) and
    /// `resource_kind` the human name of the entity ("application", ...). Both
    /// are only used when the response body carries no usable detail.
    ///
    /// # Examples
    ///
    /// ```
    /// use apptrust_provider::ProviderError;
    ///
    /// let err = ProviderError::from_response(409, br#"{"message":"key taken"}"#, "create", "application");
    /// assert!(matches!(err, ProviderError::Conflict(_)));
    /// assert_eq!(err.message(), "key taken");
    /// ```
    pub fn from_response(status: u16, body: &[u8], operation: &str, resource_kind: &str) -> Self {
        let detail = api_error::error_detail(body);
        let or_default = |fallback: String| if detail.is_empty() { fallback } else { detail.clone() };

        match status {
            400 => Self::Validation(if detail.is_empty() {
                format!(
                    "Failed to {} {}: The request was invalid (no details from server).",
                    operation, resource_kind
                )
            } else {
                format!("Failed to {} {}: {}", operation, resource_kind, detail)
            }),
            401 => Self::Unauthorized(or_default(
                "Invalid credentials (no details from server).".to_string(),
            )),
            403 => Self::Forbidden(or_default(format!(
                "You do not have permission to {} {}.",
                operation, resource_kind
            ))),
            404 => Self::NotFound(or_default(format!(
                "The {} was not found during {}.",
                resource_kind, operation
            ))),
            409 => Self::Conflict(or_default(format!(
                "A conflict occurred during {} {}.",
                operation, resource_kind
            ))),
            500 | 502 | 503 => Self::Server {
                status,
                message: or_default(format!("Server error during {} {}.", operation, resource_kind)),
            },
            _ => Self::Api {
                status,
                message: or_default(format!(
                    "Unexpected error during {} {}.",
                    operation, resource_kind
                )),
            },
        }
    }

    /// Whether this error means the remote entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Render the error as a user-facing error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Conflict(_) => "Resource Conflict",
            Self::Validation(_) => "Invalid Request",
            Self::Unauthorized(_) => "Authentication Failed",
            Self::Forbidden(_) => "Permission Denied",
            Self::Server { .. } => "Server Error",
            Self::MalformedIdentifier(_) => "Invalid Import ID",
            Self::Api { .. } => "API Error",
            Self::Configuration(_) => "Invalid Provider Configuration",
            Self::UnknownResource(_) => "Unknown Resource Type",
            Self::Serialization(_) => "Serialization Error",
            Self::Http(_) => "Unable to Reach AppTrust",
        };
        Diagnostic::error(summary).with_detail(self.to_string())
    }
}
