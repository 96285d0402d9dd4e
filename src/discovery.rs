//! # Catalog Discovery Module
//!
//! This module follows a site's published sitemap chain down to its product
//! records. It is the first stage of the digest pipeline and is all-or-nothing:
//! any failure here aborts the pipeline call.
//!
//! ## Key Components
//!
//! - `SiteTarget`: the validated base URL of a site
//! - `RobotsResolver`: reads `robots.txt` and returns the declared sitemap
//! - `parse_index`: selects the product sitemap from a sitemap index
//! - `parse_products`: turns a product sitemap into `ProductRecord`s
//! - `SitemapLocator`: fetches and parses each document of the chain
//!
//! ## Features
//!
//! - First-match sitemap declaration lookup
//! - First-entry sitemap-index selection
//! - Image extension metadata on every product record
//! - Positional fidelity: entries without `<loc>` are kept, not dropped

mod error;
mod locator;
mod product_sitemap;
mod robots;
mod sitemap_index;
mod xml;

pub use error::{ParseError, ResolutionError};
pub use locator::{DiscoveredCatalog, SitemapChain, SitemapLocator};
pub use product_sitemap::parse_products;
pub use robots::{RobotsResolver, find_sitemap_declaration};
pub use sitemap_index::{SitemapIndexEntry, parse_index, parse_index_entries};

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Base URL of the site whose catalog is being discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget(String);

impl SiteTarget {
    /// Validate a caller-supplied site URL
    ///
    /// Trailing slashes are trimmed so the robots.txt path can be appended.
    pub fn parse(site: &str) -> Result<Self, ResolutionError> {
        let trimmed = site.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ResolutionError::InvalidSite {
                site: site.to_string(),
                reason: "site URL is required".to_string(),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| ResolutionError::InvalidSite {
            site: site.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ResolutionError::InvalidSite {
                site: site.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Location of the site's robots policy
    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sitemap URL found in robots.txt or a sitemap index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SitemapReference(String);

impl SitemapReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SitemapReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `<url>` entry of a product sitemap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product page URL; `None` when the entry has no `<loc>`
    pub location: Option<String>,

    /// Images attached to the entry, in document order
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// An `<image:image>` child of a product entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    /// `<image:loc>`
    pub url: Option<String>,

    /// `<image:title>`
    pub title: Option<String>,
}
