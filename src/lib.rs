//! # Catalog Digest - Product Catalog Discovery and Summaries for Rust
//!
//! This crate turns a storefront's published sitemaps into a short, enriched
//! product digest. It follows the sitemap declared in `robots.txt` to the
//! site's product sitemap, then derives a description and an AI summary for a
//! bounded batch of products.
//!
//! ## Features
//!
//! - `robots.txt` sitemap discovery and sitemap-index resolution
//! - Product sitemap parsing with image extension metadata
//! - Page descriptions from meta tags or leading paragraphs
//! - Rate-limited summaries through any `rig` completion model
//! - Bounded, order-preserving concurrent enrichment
//! - Per-product degradations instead of batch-wide failures
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use catalog_digest::discovery::SiteTarget;
//! use catalog_digest::enrichment::DirectRenderer;
//! use catalog_digest::http::SiteClient;
//! use catalog_digest::model::GeminiGenerator;
//! use catalog_digest::pipeline::{CatalogPipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let client = SiteClient::new(&config.user_agent, config.request_timeout())?;
//!     let generator =
//!         GeminiGenerator::new_gemini_from_env(&config.summary_model, config.requests_per_minute)?;
//!
//!     let pipeline = CatalogPipeline::with_client(
//!         client.clone(),
//!         config,
//!         Arc::new(DirectRenderer::new(client)),
//!         Arc::new(generator),
//!     );
//!
//!     let site = SiteTarget::parse("https://shop.example.com")?;
//!     for product in pipeline.aggregate(&site, 6).await? {
//!         println!("{:?}: {}", product.product.location, product.summary.display_text());
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod http;
pub mod model;

pub mod discovery;
pub mod enrichment;
pub mod pipeline;

pub use error::{Error, Result};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::discovery::{ProductRecord, SiteTarget, SitemapReference};
    pub use crate::enrichment::{Degradation, Enriched, PageRenderer, TextGenerator};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::pipeline::{CatalogPipeline, EnrichedProductRecord, PipelineConfig};
}
