//! Chat session runtime executor

use super::traits::CompletionClient;
use super::{ChatSnapshot, Envelope, SseEvent};

use crate::conversation::{Conversation, Message};
use crate::llm::LlmErrorKind;
use crate::state_machine::{transition, ChatState, Effect, Event, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Runtime for one chat session, generic over the completion client
pub struct ChatRuntime<C>
where
    C: CompletionClient + ?Sized + 'static,
{
    session_id: String,
    state: ChatState,
    conversation: Conversation,
    client: Arc<C>,
    /// Submissions from handles
    event_rx: mpsc::Receiver<Envelope>,
    /// Completion results posted back by background requests
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
}

impl<C> ChatRuntime<C>
where
    C: CompletionClient + ?Sized + 'static,
{
    pub fn new(
        session_id: String,
        conversation: Conversation,
        client: Arc<C>,
        event_rx: mpsc::Receiver<Envelope>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        snapshot_tx: watch::Sender<ChatSnapshot>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(1);
        Self {
            session_id,
            state: ChatState::Idle,
            conversation,
            client,
            event_rx,
            completion_tx,
            completion_rx,
            broadcast_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting chat runtime");

        loop {
            tokio::select! {
                envelope = self.event_rx.recv() => {
                    // All handles dropped: the session is over
                    let Some(Envelope { event, reply }) = envelope else { break };
                    let outcome = self.process_event(event);
                    if let Some(reply) = reply {
                        let _ = reply.send(outcome);
                    }
                }
                Some(event) = self.completion_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(session_id = %self.session_id, error = %e, "Dropped completion result");
                    }
                }
            }
        }

        tracing::info!(session_id = %self.session_id, "Chat runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let failure = match &event {
            Event::CompletionFailed {
                message,
                error_kind,
            } => Some((message.clone(), *error_kind)),
            _ => None,
        };

        let result = transition(self.state, event).inspect_err(|e| {
            tracing::debug!(session_id = %self.session_id, reason = %e, "Event ignored");
        })?;

        if let Some((message, kind)) = failure {
            tracing::warn!(
                session_id = %self.session_id,
                error = %message,
                kind = ?kind,
                "Completion failed, replying with fallback"
            );
        }

        let was_busy = self.state.is_busy();
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        if was_busy != self.state.is_busy() {
            let _ = self.broadcast_tx.send(SseEvent::StateChange {
                busy: self.state.is_busy(),
            });
        }
        self.publish_snapshot();

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { sender, text } => {
                let message = Message::new(sender, text);
                self.conversation.append(message.clone());
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }

            Effect::RequestCompletion { text } => self.spawn_completion(text),

            Effect::NotifyTurnComplete => {
                tracing::debug!(
                    session_id = %self.session_id,
                    messages = self.conversation.len(),
                    reply_id = self.conversation.last().map_or("", |m| m.id.as_str()),
                    "Turn complete"
                );
                let _ = self.broadcast_tx.send(SseEvent::TurnComplete);
            }
        }
    }

    /// Run the completion in the background and post exactly one result
    /// event back, even if the request task panics.
    fn spawn_completion(&self, text: String) {
        let client = self.client.clone();
        let completion_tx = self.completion_tx.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            tracing::info!(
                session_id = %session_id,
                model = %client.model_id(),
                "Requesting completion (background)"
            );

            let request = tokio::spawn(async move { client.complete(&text).await });

            let event = match request.await {
                Ok(Ok(reply)) => Event::CompletionSucceeded { text: reply },
                Ok(Err(e)) => Event::CompletionFailed {
                    message: e.message,
                    error_kind: e.kind,
                },
                Err(e) => Event::CompletionFailed {
                    message: format!("Completion task failed: {e}"),
                    error_kind: LlmErrorKind::Unknown,
                },
            };

            if completion_tx.send(event).await.is_err() {
                tracing::debug!(session_id = %session_id, "Session gone before completion arrived");
            }
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(ChatSnapshot {
            messages: self.conversation.all().to_vec(),
            busy: self.state.is_busy(),
        });
    }
}
