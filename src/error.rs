//! Error types for the provider.

use thiserror::Error;
use tracing::error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configuration API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Short description of the failed call.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// A failed request, with the operation that was being attempted.
    #[error("{summary}: {source}")]
    Request {
        /// e.g. "An error occurred while getting the Log Retention Policy".
        summary: String,
        /// The underlying failure.
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Wrap this error with a human-readable summary of the failed operation.
    pub fn context(self, summary: impl Into<String>) -> Self {
        Self::Request {
            summary: summary.into(),
            source: Box::new(self),
        }
    }

    /// HTTP status of the underlying API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Request { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Raw HTTP response body of the underlying API error, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            Self::Request { source, .. } => source.response_body(),
            _ => None,
        }
    }

    /// Convert the error into an error diagnostic.
    ///
    /// A [`ProviderError::Request`] becomes a diagnostic whose summary is the
    /// operation summary and whose detail carries the underlying error and
    /// the raw response body.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Request { summary, source } => {
                let mut detail = format!("Error: {}", source);
                if let Some(body) = source.response_body().filter(|b| !b.is_empty()) {
                    detail.push_str(&format!("\nHTTP response body: {}", body));
                }
                Diagnostic::error(summary.as_str()).with_detail(detail)
            },
            other => Diagnostic::error(other.to_string()),
        }
    }
}

/// Record a failed HTTP call as an error diagnostic.
pub fn report_http_error(diagnostics: &mut Vec<Diagnostic>, err: &ProviderError) {
    error!(error = %err, "request failed");
    diagnostics.push(err.to_diagnostic());
}
