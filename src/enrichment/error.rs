//! Error types for the enrichment module
//!
//! These never leave the module: the description fetcher and the summarizer
//! turn them into a [`Degradation`](super::Degradation) for the product at hand.

use thiserror::Error;

use crate::http::FetchError;

/// Error type for a single collaborator call
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The page or provider could not be fetched
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The product entry has no URL to render
    #[error("product has no location")]
    MissingLocation,

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// The text-generation provider failed
    #[error("generation error: {0}")]
    Generation(String),
}
