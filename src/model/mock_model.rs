//! # Mock Completion Model for Testing
//!
//! `MockCompletionModel` implements rig's `CompletionModel` so the summarizer's
//! generator path can be exercised without calling Gemini. A scripted reply or
//! a provider error can be set before the call.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// What the mock answers with
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

/// A completion model that replays a scripted reply
#[derive(Debug, Clone)]
pub struct MockCompletionModel {
    reply: Arc<Mutex<Option<Reply>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a mock that answers with empty text until scripted
    pub fn new() -> Self {
        Self {
            reply: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every request with `text`
    pub async fn set_text_response(&self, text: &str) {
        *self.reply.lock().await = Some(Reply::Text(text.to_string()));
    }

    /// Fail every request with a provider error
    pub async fn set_error(&self, message: &str) {
        *self.reply.lock().await = Some(Reply::Error(message.to_string()));
    }

    /// Number of completion requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().await.clone();
        let text = match reply {
            Some(Reply::Error(message)) => return Err(CompletionError::ProviderError(message)),
            Some(Reply::Text(text)) => text,
            None => String::new(),
        };
        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&text)),
            raw_response: text,
        })
    }
}
