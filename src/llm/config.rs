//! Configuration for the completion service

use super::anthropic::{DEFAULT_API_URL, DEFAULT_MODEL};
use super::{AnthropicService, LlmError, LlmService, LoggingService};
use std::sync::Arc;

const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Configuration for the LLM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Credential injected as `x-api-key`; unset sends no auth header
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            api_url: lookup("FINMATE_API_URL").unwrap_or(defaults.api_url),
            model: lookup("FINMATE_MODEL").unwrap_or(defaults.model),
            max_tokens: lookup("FINMATE_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the provider, wrapped with request logging
    pub fn build_service(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        let service = AnthropicService::new(
            self.api_key.clone(),
            self.model.clone(),
            self.api_url.clone(),
        )?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}
