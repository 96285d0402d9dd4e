//! Error types for the catalog-digest crate

use thiserror::Error;

use crate::discovery::{ParseError, ResolutionError};
use crate::http::FetchError;

/// Result type for catalog-digest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for catalog-digest operations
///
/// Only catalog discovery produces these. Per-product enrichment never fails
/// a pipeline call; it degrades instead (see [`crate::enrichment::Degradation`]).
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sitemap chain could not be resolved
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// A sitemap document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(e) => Error::Http(e),
            _ => Error::Other(err.to_string()),
        }
    }
}
