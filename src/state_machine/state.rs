//! Chat state types

use serde::{Deserialize, Serialize};

/// Chat session state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    /// Ready for user input, no request in flight
    #[default]
    Idle,
    /// Completion request in flight; new submissions are rejected
    AwaitingResponse,
}

impl ChatState {
    /// The busy flag shown to the display
    pub fn is_busy(self) -> bool {
        matches!(self, ChatState::AwaitingResponse)
    }
}
