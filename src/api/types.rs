//! API request and response types

use crate::conversation::Message;
use crate::runtime::ChatSnapshot;
use crate::system_prompt::QUICK_QUESTIONS;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// A session's messages, busy flag and quick questions
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub busy: bool,
    pub quick_questions: &'static [&'static str],
}

impl SessionResponse {
    pub fn new(session_id: impl Into<String>, snapshot: ChatSnapshot) -> Self {
        Self {
            session_id: session_id.into(),
            messages: snapshot.messages,
            busy: snapshot.busy,
            quick_questions: &QUICK_QUESTIONS,
        }
    }
}

/// Response for a submission. Ignored submissions are not errors.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
