//! Error types for the discovery module

use thiserror::Error;

use crate::http::FetchError;

/// The sitemap chain could not be followed to a product sitemap
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The caller supplied an empty or unparseable site URL
    #[error("invalid site URL '{site}': {reason}")]
    InvalidSite {
        /// Site as supplied
        site: String,
        /// Why it was rejected
        reason: String,
    },

    /// robots.txt could not be fetched
    #[error("robots.txt unavailable at {url}: {source}")]
    RobotsUnavailable {
        /// robots.txt URL
        url: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// robots.txt was fetched but declares no sitemap
    #[error("Sitemap URL not found in robots.txt at {url}")]
    MissingSitemapDeclaration {
        /// robots.txt URL
        url: String,
    },

    /// A sitemap document could not be fetched
    #[error("sitemap unavailable at {url}: {source}")]
    SitemapUnavailable {
        /// Sitemap URL
        url: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },
}

/// A sitemap document did not have the expected structure
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The document root is not the expected element
    #[error("expected <{expected}> root element, found {found}")]
    UnexpectedRoot {
        /// Expected root element name
        expected: &'static str,
        /// Root element found, or a description of its absence
        found: String,
    },

    /// A required element is missing
    #[error("missing required element: {0}")]
    MissingElement(&'static str),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::errors::serialize::DeError> for ParseError {
    fn from(err: quick_xml::errors::serialize::DeError) -> Self {
        Self::Xml(err.to_string())
    }
}
