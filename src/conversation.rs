//! Conversation store
//!
//! An ordered, append-only list of chat messages held in process memory.
//! Insertion order is the only ordering guarantee.

use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
        }
    }

    #[cfg(test)]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}

/// Ordered sequence of messages for one session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened with the bot's greeting
    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self::new();
        conversation.append(Message::bot(greeting));
        conversation
    }

    /// Add a message to the end. This is the only mutation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
