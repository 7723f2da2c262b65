//! Error types

mod field;
mod http;
mod parse;

pub use field::*;
pub use http::*;
pub use parse::*;

/// Top-level error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parsing an Atom response body failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The HTTP exchange failed or the service answered with an error status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A typed field accessor was used on an incompatible record field.
    #[error(transparent)]
    Field(#[from] FieldError),
}
