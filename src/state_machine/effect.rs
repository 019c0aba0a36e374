//! Effects produced by state transitions

use crate::conversation::Sender;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the conversation
    AppendMessage { sender: Sender, text: String },

    /// Ask the completion service to answer `text`
    RequestCompletion { text: String },

    /// Tell connected displays the turn has finished
    NotifyTurnComplete,
}

impl Effect {
    pub fn append_user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn append_bot_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}
