//! Bullet-point summaries of product descriptions

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::enrichment::description::DescriptionResult;
use crate::enrichment::error::EnrichError;
use crate::enrichment::outcome::{Degradation, Enriched};

/// Instruction prepended to every description
pub const DEFAULT_SUMMARY_INSTRUCTION: &str =
    "Filter and summarize the given text based on the product in 3 very short bullet points: ";

/// Generates free-form text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, EnrichError>;
}

/// Drop the model's leading preamble and flatten the remaining paragraphs
///
/// The raw text is split on blank lines, the first segment is discarded and
/// the rest is joined with single spaces.
pub fn clean_summary(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Summarizes descriptions through a [`TextGenerator`]
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    instruction: String,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            instruction: DEFAULT_SUMMARY_INSTRUCTION.to_string(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Build the prompt sent to the generator
    pub fn prompt_for(&self, description: &str) -> String {
        format!("{} {}", self.instruction, description)
    }

    /// Summarize `description`; failures degrade to [`Degradation::SummarizeFailed`]
    #[instrument(skip(self, description), fields(description_len = description.len()))]
    pub async fn summarize(&self, description: &str) -> Enriched<String> {
        let prompt = self.prompt_for(description);
        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Error summarizing description: {}", e);
                return Enriched::Degraded(Degradation::SummarizeFailed {
                    detail: e.to_string(),
                });
            }
        };

        if raw.trim().is_empty() {
            warn!("Text generator returned an empty response");
            return Enriched::Degraded(Degradation::SummarizeFailed {
                detail: "empty response".to_string(),
            });
        }

        let summary = clean_summary(&raw);
        if summary.is_empty() {
            warn!("Summary was empty after removing the preamble");
            return Enriched::Degraded(Degradation::SummarizeFailed {
                detail: "no content after preamble".to_string(),
            });
        }

        debug!("Generated summary of length {}", summary.len());
        Enriched::Value(summary)
    }

    /// Summarize a fetched description, skipping degraded ones
    pub async fn summarize_description(&self, description: &DescriptionResult) -> Enriched<String> {
        match description {
            Enriched::Value(description) => self.summarize(&description.text).await,
            Enriched::Degraded(reason) => {
                debug!("Skipping summary: description {}", reason.reason_code());
                Enriched::Degraded(Degradation::DescriptionUnavailable)
            }
        }
    }
}
