//! # LLM Client Module
//!
//! Connects the summarizer's [`TextGenerator`] capability to a `rig`
//! completion model, with client-side rate limiting so a batch of summaries
//! stays inside the provider's request quota.
//!
//! ## Key Components
//!
//! - `CompletionGenerator`: a `TextGenerator` backed by any rig `CompletionModel`
//! - `RateLimitedCompletionModel`: a wrapper that adds rate limiting to any completion model
//! - `GeminiGenerator`: the rate-limited Gemini generator used by the CLI

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use rig::{agent::AgentBuilder, completion::CompletionModel, completion::Prompt, providers::gemini};
use tracing::{debug, instrument};

use crate::enrichment::{EnrichError, TextGenerator};
use crate::error::{Error, Result};

#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;

pub use ratelimited_completion::RateLimitedCompletionModel;

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

/// A [`TextGenerator`] that prompts a rig completion model through an agent
#[derive(Debug, Clone)]
pub struct CompletionGenerator<M>
where
    M: CompletionModel,
{
    completion_model: M,
}

/// Rate-limited Gemini generator
pub type GeminiGenerator =
    CompletionGenerator<RateLimitedCompletionModel<gemini::completion::CompletionModel>>;

impl<M> CompletionGenerator<M>
where
    M: CompletionModel,
{
    pub fn new(completion_model: M) -> Self {
        Self { completion_model }
    }

    pub fn completion(&self) -> &M {
        &self.completion_model
    }
}

impl GeminiGenerator {
    /// Build a Gemini generator limited to `requests_per_minute`
    pub fn new_gemini(
        gemini_client: gemini::Client,
        model: &str,
        requests_per_minute: u32,
    ) -> Result<Self> {
        let quota = NonZeroU32::new(requests_per_minute).ok_or_else(|| {
            Error::Config("requests_per_minute must be greater than zero".to_string())
        })?;
        let completion_model = RateLimitedCompletionModel::new(
            gemini_client.completion_model(model),
            RateLimiter::direct(Quota::per_minute(quota)),
        );
        Ok(Self::new(completion_model))
    }

    /// Build a Gemini generator from the `GEMINI_API_KEY` environment variable
    pub fn new_gemini_from_env(model: &str, requests_per_minute: u32) -> Result<Self> {
        let gemini_api_key = std::env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            Error::Config(format!("{} environment variable must be set", GEMINI_API_KEY_ENV))
        })?;
        let gemini_client = gemini::Client::new(&gemini_api_key);
        Self::new_gemini(gemini_client, model, requests_per_minute)
    }
}

#[async_trait]
impl<M> TextGenerator for CompletionGenerator<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> std::result::Result<String, EnrichError> {
        let agent = AgentBuilder::new(self.completion_model.clone()).build();
        let answer = agent
            .prompt(prompt)
            .await
            .map_err(|e| EnrichError::Generation(e.to_string()))?;
        debug!("Generated {} chars", answer.len());
        Ok(answer)
    }
}
