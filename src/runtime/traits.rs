//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::system_prompt::build_prompt;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns one user utterance into one assistant utterance
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Answer `user_text`. No earlier turns are sent.
    async fn complete(&self, user_text: &str) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(&self, user_text: &str) -> Result<String, LlmError> {
        (**self).complete(user_text).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter that wraps the user's text in the persona prompt and sends it
/// to an `LlmService` as a single user message
pub struct PromptedCompletionClient {
    service: Arc<dyn LlmService>,
    max_tokens: u32,
}

impl PromptedCompletionClient {
    pub fn new(service: Arc<dyn LlmService>, max_tokens: u32) -> Self {
        Self {
            service,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for PromptedCompletionClient {
    async fn complete(&self, user_text: &str) -> Result<String, LlmError> {
        let request = LlmRequest::single_user(build_prompt(user_text), self.max_tokens);
        let response = self.service.complete(&request).await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::malformed("Response does not start with a text block"))
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}
