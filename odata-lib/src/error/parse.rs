//! Atom parse error types

/// Errors that can occur while turning an Atom response body into records.
///
/// A `Service` error means the document itself was well-formed but carried
/// the service's error node; its message is passed through verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// The body could not be parsed as XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The parsed document contains a service-level error node.
    #[error("{0}")]
    Service(String),
}

impl ParseError {
    /// Creates a new malformed-XML error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a new service-fault error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    /// Returns the underlying message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Malformed(m) | Self::Service(m) => m,
        }
    }
}
