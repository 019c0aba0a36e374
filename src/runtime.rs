//! Runtime for chat sessions
//!
//! Each session owns one conversation and one busy flag, driven by a
//! background task. Callers talk to it through a [`ChatHandle`].

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;
pub use traits::*;

use crate::conversation::{Conversation, Message};
use crate::state_machine::{Event, TransitionError};
use crate::system_prompt::{GREETING, QUICK_QUESTIONS};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        messages: Vec<Message>,
        busy: bool,
    },
    Message {
        message: Message,
    },
    StateChange {
        busy: bool,
    },
    TurnComplete,
}

/// Point-in-time view of a session for the display
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub busy: bool,
}

/// Why a submission was not accepted
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("No quick question at index {0}")]
    UnknownQuickReply(usize),
    #[error("Chat session has stopped")]
    RuntimeStopped,
}

/// An event plus an optional channel for the transition outcome
#[derive(Debug)]
pub struct Envelope {
    pub event: Event,
    pub reply: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

/// Handle to interact with a running chat session
#[derive(Clone)]
pub struct ChatHandle {
    session_id: String,
    event_tx: mpsc::Sender<Envelope>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
}

impl ChatHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Submit raw user text.
    ///
    /// Resolves once the runtime has accepted or rejected the text; the
    /// reply arrives later. Blank text and text sent while busy are
    /// rejected without touching the conversation.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            event: Event::UserSubmit { text: text.into() },
            reply: Some(reply_tx),
        };

        self.event_tx
            .send(envelope)
            .await
            .map_err(|_| SubmitError::RuntimeStopped)?;

        reply_rx.await.map_err(|_| SubmitError::RuntimeStopped)??;
        Ok(())
    }

    /// Submit one of the canned questions, exactly as if it were typed
    pub async fn quick_reply(&self, index: usize) -> Result<(), SubmitError> {
        let question = QUICK_QUESTIONS
            .get(index)
            .ok_or(SubmitError::UnknownQuickReply(index))?;
        self.submit(*question).await
    }

    /// Latest messages and busy flag
    pub fn current_state(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to session updates
    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Whether any display is following this session
    pub fn has_subscribers(&self) -> bool {
        self.broadcast_tx.receiver_count() > 0
    }

    /// Wait until no request is in flight
    pub async fn wait_until_idle(&self) -> Result<ChatSnapshot, SubmitError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| !s.busy)
            .await
            .map_err(|_| SubmitError::RuntimeStopped)?
            .clone();
        Ok(snapshot)
    }
}

/// Start a session runtime in the background and return its handle
pub fn spawn_session<C>(session_id: impl Into<String>, client: Arc<C>) -> ChatHandle
where
    C: CompletionClient + ?Sized + 'static,
{
    let session_id = session_id.into();
    let conversation = Conversation::with_greeting(GREETING);

    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(ChatSnapshot {
        messages: conversation.all().to_vec(),
        busy: false,
    });

    let runtime = ChatRuntime::new(
        session_id.clone(),
        conversation,
        client,
        event_rx,
        broadcast_tx.clone(),
        snapshot_tx,
    );

    let id = session_id.clone();
    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(session_id = %id, "Chat runtime finished");
    });

    ChatHandle {
        session_id,
        event_tx,
        broadcast_tx,
        snapshot_rx,
    }
}

/// A session handle plus when a caller last touched it
struct SessionEntry {
    handle: ChatHandle,
    last_active: Instant,
}

/// Manager for all chat sessions
pub struct RuntimeManager {
    client: Arc<dyn CompletionClient>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl RuntimeManager {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a fresh session holding only the greeting
    pub async fn create_session(&self) -> ChatHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let handle = spawn_session(session_id.clone(), self.client.clone());

        self.sessions.write().await.insert(
            session_id.clone(),
            SessionEntry {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::info!(session_id = %session_id, "Session opened");

        handle
    }

    /// Get a running session and mark it active
    pub async fn get(&self, session_id: &str) -> Option<ChatHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.last_active = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop a session. Its runtime stops once the last handle is gone.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session closed");
        }
        removed
    }

    /// Drop every session untouched for `max_idle` that has no open
    /// stream and no request in flight. Returns how many were dropped.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|session_id, entry| {
            let keep = entry.last_active.elapsed() < max_idle
                || entry.handle.has_subscribers()
                || entry.handle.current_state().busy;
            if !keep {
                tracing::info!(session_id = %session_id, "Idle session reaped");
            }
            keep
        });

        before - sessions.len()
    }

    /// Sweep idle sessions every `every` until the manager is dropped
    pub fn spawn_reaper(self: &Arc<Self>, every: Duration, max_idle: Duration) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                let reaped = manager.reap_idle(max_idle).await;
                if reaped > 0 {
                    let remaining = manager.session_count().await;
                    tracing::info!(reaped, remaining, "Session sweep finished");
                }
            }
        });
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
