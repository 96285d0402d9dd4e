//! Sitemap-index parsing
//!
//! Only the first `<sitemap>` entry of an index is followed. Sites that split
//! their catalog across several product sitemaps are covered by that first
//! sitemap alone.

use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::discovery::SitemapReference;
use crate::discovery::error::ParseError;
use crate::discovery::xml::{expect_root, non_blank};

/// XML representation of a `<sitemapindex>` document
#[derive(Debug, Deserialize)]
#[serde(rename = "sitemapindex")]
struct SitemapIndexDocument {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<SitemapIndexEntry>,
}

/// One `<sitemap>` entry of a sitemap index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapIndexEntry {
    /// Location of the child sitemap
    #[serde(rename = "loc", default)]
    pub location: Option<String>,

    /// Last modification date as published
    #[serde(rename = "lastmod", default)]
    pub last_modified: Option<String>,
}

/// Parse every entry of a sitemap index, in document order
pub fn parse_index_entries(xml: &str) -> Result<Vec<SitemapIndexEntry>, ParseError> {
    expect_root(xml, "sitemapindex")?;
    let document: SitemapIndexDocument = from_str(xml)?;
    Ok(document.sitemaps)
}

/// Return the location of the first entry of a sitemap index
pub fn parse_index(xml: &str) -> Result<SitemapReference, ParseError> {
    let entries = parse_index_entries(xml)?;
    debug!("Sitemap index lists {} sitemaps", entries.len());

    let first = entries
        .into_iter()
        .next()
        .ok_or(ParseError::MissingElement("sitemapindex/sitemap"))?;

    first
        .location
        .as_deref()
        .and_then(non_blank)
        .map(SitemapReference::new)
        .ok_or(ParseError::MissingElement("sitemapindex/sitemap/loc"))
}
