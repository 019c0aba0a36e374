//! Events that can occur in a chat session

use crate::llm::LlmErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Raw text typed by the user or picked from the quick questions
    UserSubmit { text: String },

    /// Completion service replied with usable text
    CompletionSucceeded { text: String },

    /// Completion failed for any reason
    CompletionFailed {
        message: String,
        error_kind: LlmErrorKind,
    },
}
