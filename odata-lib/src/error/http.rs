//! HTTP transport error types

/// Errors that can occur during the HTTP exchange with the service.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The service answered with an error status (>= 400).
    #[error("HTTP response error {status} for uri \"{url}\"")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested URL.
        url: String,
        /// Raw response body, useful for diagnostics.
        body: String,
    },

    /// Network-level failure while performing the request.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Creates a new status error.
    pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Returns the HTTP status code if this is a status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
