//! Common types for LLM interactions

/// LLM request: one user message, never earlier turns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn single_user(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Content block in a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
    /// Any block kind this crate does not consume
    Other { kind: String },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl LlmResponse {
    /// Text of the first content block, if that block is text
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first()? {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other { .. } => None,
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
