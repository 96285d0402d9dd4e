//! # Pipeline Configuration Module
//!
//! Configuration for the catalog digest pipeline, built with a builder like
//! every other configurable stage of the crate.
//!
//! ## Key Components
//!
//! - `PipelineConfig`: batch size, fan-out bound, extraction and model settings
//! - `PipelineConfigBuilder`: builder pattern implementation for easier configuration
//!
//! The batch size (`limit`) and the concurrency bound are separate values: the
//! bound caps how many products are in flight against the scraping and
//! summarization providers at once, whatever the batch size.

use std::time::Duration;

use crate::enrichment::{DEFAULT_PARAGRAPH_LIMIT, DEFAULT_SUMMARY_INSTRUCTION};
use crate::http::DEFAULT_TIMEOUT_SECS;

/// Default number of products enriched per call
pub const DEFAULT_LIMIT: usize = 6;

/// Configuration for the digest pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of products taken from the product sitemap
    pub limit: usize,

    /// Maximum number of products enriched at the same time
    pub concurrency: usize,

    /// Paragraphs used for a description when there is no meta description
    pub paragraph_limit: usize,

    /// User agent for robots.txt, sitemap and page requests
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Model used for summaries
    pub summary_model: String,

    /// Instruction prepended to each description
    pub summary_instruction: String,

    /// Client-side quota for summary requests
    pub requests_per_minute: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            concurrency: DEFAULT_LIMIT,
            paragraph_limit: DEFAULT_PARAGRAPH_LIMIT,
            user_agent: format!("catalog-digest/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            summary_model: "gemini-1.5-flash".to_string(),
            summary_instruction: DEFAULT_SUMMARY_INSTRUCTION.to_string(),
            requests_per_minute: 15,
        }
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the number of products to enrich
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the maximum number of products enriched concurrently
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the paragraph fallback limit
    pub fn paragraph_limit(mut self, paragraph_limit: usize) -> Self {
        self.config.paragraph_limit = paragraph_limit;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, request_timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = request_timeout_secs;
        self
    }

    /// Set the summary model
    pub fn summary_model(mut self, summary_model: impl Into<String>) -> Self {
        self.config.summary_model = summary_model.into();
        self
    }

    /// Set the summary instruction
    pub fn summary_instruction(mut self, summary_instruction: impl Into<String>) -> Self {
        self.config.summary_instruction = summary_instruction.into();
        self
    }

    /// Set the summary request quota
    pub fn requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.config.requests_per_minute = requests_per_minute;
        self
    }

    /// Build the configuration
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl PipelineConfig {
    /// Create a new builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Concurrency bound actually used for a batch of `batch_size` products
    ///
    /// Never zero, and never wider than the batch.
    pub fn effective_concurrency(&self, batch_size: usize) -> usize {
        self.concurrency.clamp(1, batch_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.limit, 6);
        assert_eq!(config.concurrency, 6);
        assert_eq!(config.paragraph_limit, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .limit(20)
            .concurrency(4)
            .paragraph_limit(3)
            .user_agent("test-agent")
            .request_timeout_secs(5)
            .summary_model("gemini-2.0-flash")
            .summary_instruction("Summarize:")
            .requests_per_minute(30)
            .build();

        assert_eq!(config.limit, 20);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.paragraph_limit, 3);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.summary_model, "gemini-2.0-flash");
        assert_eq!(config.summary_instruction, "Summarize:");
        assert_eq!(config.requests_per_minute, 30);
    }

    #[test]
    fn test_effective_concurrency() {
        let config = PipelineConfig::builder().concurrency(4).build();
        assert_eq!(config.effective_concurrency(10), 4);
        assert_eq!(config.effective_concurrency(2), 2);

        let config = PipelineConfig::builder().concurrency(0).build();
        assert_eq!(config.effective_concurrency(10), 1);
        assert_eq!(config.effective_concurrency(0), 1);
    }
}
