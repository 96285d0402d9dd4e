//! # Product Enrichment Module
//!
//! Per-product description and summary generation. Unlike discovery, this
//! stage is best-effort: every collaborator failure is contained to the product
//! it happened on and reported as a [`Degradation`].
//!
//! ## Key Components
//!
//! - `PageRenderer`: capability that turns a URL into HTML plus a meta description
//! - `PageDescriptionFetcher`: picks the meta description or the first paragraphs
//! - `TextGenerator`: capability that turns a prompt into text
//! - `Summarizer`: prompts for a 3-bullet summary and strips the preamble
//! - `Enriched<T>`: a value or the degradation that replaced it

mod description;
mod error;
mod outcome;
mod render;
mod summarizer;

pub use description::{
    DEFAULT_PARAGRAPH_LIMIT, Description, DescriptionResult, DescriptionSource,
    PageDescriptionFetcher, describe_rendered_page, extract_paragraphs,
};
pub use error::EnrichError;
pub use outcome::{Degradation, Enriched};
pub use render::{
    DirectRenderer, PageRenderer, RenderedPage, SCRAPINGBEE_BASE_URL, ScrapingBeeRenderer,
    extract_meta_description,
};
pub use summarizer::{DEFAULT_SUMMARY_INSTRUCTION, Summarizer, TextGenerator, clean_summary};
