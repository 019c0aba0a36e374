//! Pure state transition function

use super::{ChatState, Effect, Event};
use crate::system_prompt::FALLBACK_REPLY;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A reply is still pending, cannot accept another message")]
    Busy,
    #[error("Message is empty")]
    EmptyInput,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Every accepted `UserSubmit` is followed by exactly one bot message once
/// its completion event arrives.
pub fn transition(state: ChatState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Blank input never reaches the completion client, whatever the state
        (_, Event::UserSubmit { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        // Idle + UserSubmit -> AwaitingResponse
        (ChatState::Idle, Event::UserSubmit { text }) => {
            Ok(TransitionResult::new(ChatState::AwaitingResponse)
                .with_effect(Effect::append_user_message(text.clone()))
                .with_effect(Effect::RequestCompletion { text }))
        }

        (ChatState::AwaitingResponse, Event::UserSubmit { .. }) => Err(TransitionError::Busy),

        // AwaitingResponse + reply -> Idle
        (ChatState::AwaitingResponse, Event::CompletionSucceeded { text }) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::append_bot_message(text))
                .with_effect(Effect::NotifyTurnComplete))
        }

        // AwaitingResponse + failure -> Idle, with the fixed apology
        (ChatState::AwaitingResponse, Event::CompletionFailed { .. }) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::append_bot_message(FALLBACK_REPLY))
                .with_effect(Effect::NotifyTurnComplete))
        }

        (ChatState::Idle, event @ (Event::CompletionSucceeded { .. } | Event::CompletionFailed { .. })) => {
            Err(TransitionError::InvalidTransition(format!(
                "{event:?} received while idle"
            )))
        }
    }
}
