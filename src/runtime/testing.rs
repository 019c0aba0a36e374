//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::llm::LlmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

// ============================================================================
// Mock Completion Client
// ============================================================================

/// Mock completion client that returns queued results
pub struct MockCompletionClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    model_id: String,
    /// Record of every user text the client was asked about
    pub requests: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self, user_text: &str) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(user_text.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, user_text: &str) -> Result<String, LlmError> {
        self.next_response(user_text)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Gated Mock Completion Client (for in-flight testing)
// ============================================================================

/// Mock completion client that holds each request until released
pub struct GatedMockCompletionClient {
    inner: MockCompletionClient,
    gate: Semaphore,
}

impl GatedMockCompletionClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            inner: MockCompletionClient::new(model_id),
            gate: Semaphore::new(0),
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.queue_reply(text);
    }

    /// Let one pending (or future) request finish
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn recorded_requests(&self) -> Vec<String> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl CompletionClient for GatedMockCompletionClient {
    async fn complete(&self, user_text: &str) -> Result<String, LlmError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| LlmError::unknown(e.to_string()))?;
        permit.forget();
        self.inner.next_response(user_text)
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

/// Client whose request task panics, to exercise the guaranteed reply
pub struct PanickingCompletionClient;

#[async_trait]
impl CompletionClient for PanickingCompletionClient {
    async fn complete(&self, _user_text: &str) -> Result<String, LlmError> {
        panic!("simulated transport crash");
    }

    fn model_id(&self) -> &str {
        "panicking"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;
    use crate::runtime::{spawn_session, ChatHandle, RuntimeManager, SseEvent, SubmitError};
    use crate::state_machine::TransitionError;
    use crate::system_prompt::{FALLBACK_REPLY, GREETING, QUICK_QUESTIONS};
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn session<C: CompletionClient + 'static>(client: Arc<C>) -> ChatHandle {
        spawn_session("test-session", client)
    }

    async fn idle(handle: &ChatHandle) -> crate::runtime::ChatSnapshot {
        timeout(WAIT, handle.wait_until_idle())
            .await
            .expect("turn did not finish")
            .unwrap()
    }

    fn texts(handle: &ChatHandle) -> Vec<(Sender, String)> {
        handle
            .current_state()
            .messages
            .into_iter()
            .map(|m| (m.sender, m.text))
            .collect()
    }

    #[tokio::test]
    async fn test_mock_completion_client() {
        let mock = MockCompletionClient::new("test-model");
        mock.queue_reply("Hello");

        assert_eq!(mock.complete("hi").await.unwrap(), "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete("again").await.is_err());
        assert_eq!(mock.recorded_requests(), vec!["hi", "again"]);
    }

    #[tokio::test]
    async fn test_initial_state_is_greeting_only() {
        let handle = session(Arc::new(MockCompletionClient::new("m")));
        let state = handle.current_state();

        assert!(!state.busy);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].sender, Sender::Bot);
        assert_eq!(state.messages[0].text, GREETING);
    }

    /// The example scenario: greeting, question, reply
    #[tokio::test]
    async fn test_simple_turn() {
        let client = Arc::new(MockCompletionClient::new("m"));
        client.queue_reply("Term life insurance ...");
        let handle = session(client.clone());

        handle.submit("What is term life insurance?").await.unwrap();
        let state = idle(&handle).await;

        assert_eq!(state.messages.len(), 3);
        assert_eq!(
            texts(&handle),
            vec![
                (Sender::Bot, GREETING.to_string()),
                (Sender::User, "What is term life insurance?".to_string()),
                (Sender::Bot, "Term life insurance ...".to_string()),
            ]
        );
        assert_eq!(client.recorded_requests(), vec!["What is term life insurance?"]);
    }

    #[tokio::test]
    async fn test_failure_appends_fallback() {
        let client = Arc::new(MockCompletionClient::new("m"));
        client.queue_error(LlmError::network("connection refused"));
        let handle = session(client);

        handle.submit("Hello?").await.unwrap();
        let state = idle(&handle).await;

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[2].sender, Sender::Bot);
        assert_eq!(state.messages[2].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let client = Arc::new(MockCompletionClient::new("m"));
        let handle = session(client.clone());

        for text in ["", "   ", "\n"] {
            let result = handle.submit(text).await;
            assert!(matches!(
                result,
                Err(SubmitError::Rejected(TransitionError::EmptyInput))
            ));
        }

        let state = handle.current_state();
        assert_eq!(state.messages.len(), 1);
        assert!(!state.busy);
        assert!(client.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_second_submission_while_busy_is_ignored() {
        let client = Arc::new(GatedMockCompletionClient::new("m"));
        client.queue_reply("first answer");
        let handle = session(client.clone());

        handle.submit("first").await.unwrap();
        let state = handle.current_state();
        assert!(state.busy);
        assert_eq!(state.messages.len(), 2);

        let second = handle.submit("second").await;
        assert!(matches!(
            second,
            Err(SubmitError::Rejected(TransitionError::Busy))
        ));
        assert_eq!(handle.current_state().messages.len(), 2);

        client.release();
        let state = idle(&handle).await;

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[2].text, "first answer");
        assert_eq!(client.recorded_requests(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_quick_reply_matches_typed_submission() {
        for (index, question) in QUICK_QUESTIONS.iter().enumerate() {
            let quick_client = Arc::new(MockCompletionClient::new("m"));
            quick_client.queue_reply("answer");
            let quick = session(quick_client.clone());
            quick.quick_reply(index).await.unwrap();
            idle(&quick).await;

            let typed_client = Arc::new(MockCompletionClient::new("m"));
            typed_client.queue_reply("answer");
            let typed = session(typed_client.clone());
            typed.submit(*question).await.unwrap();
            idle(&typed).await;

            assert_eq!(texts(&quick), texts(&typed));
            assert_eq!(
                quick_client.recorded_requests(),
                typed_client.recorded_requests()
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_quick_reply_index() {
        let handle = session(Arc::new(MockCompletionClient::new("m")));
        let result = handle.quick_reply(QUICK_QUESTIONS.len()).await;
        assert!(matches!(result, Err(SubmitError::UnknownQuickReply(4))));
        assert_eq!(handle.current_state().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_client_still_gets_one_reply() {
        let handle = session(Arc::new(PanickingCompletionClient));

        handle.submit("Are you there?").await.unwrap();
        let state = idle(&handle).await;

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[2].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_many_turns_stay_paired() {
        let client = Arc::new(MockCompletionClient::new("m"));
        for i in 0..5 {
            if i % 2 == 0 {
                client.queue_reply(format!("reply {i}"));
            } else {
                client.queue_error(LlmError::server_error("503"));
            }
        }
        let handle = session(client);

        for i in 0..5 {
            handle.submit(format!("question {i}")).await.unwrap();
            idle(&handle).await;
        }

        let messages = handle.current_state().messages;
        assert_eq!(messages.len(), 11);
        for pair in messages[1..].chunks(2) {
            assert_eq!(pair[0].sender, Sender::User);
            assert_eq!(pair[1].sender, Sender::Bot);
        }
        assert_eq!(messages[2].text, "reply 0");
        assert_eq!(messages[4].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_broadcast_sequence_for_one_turn() {
        let client = Arc::new(MockCompletionClient::new("m"));
        client.queue_reply("X");
        let handle = session(client);
        let mut rx = handle.subscribe();

        handle.submit("Q").await.unwrap();

        let mut events = Vec::new();
        loop {
            let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
            let done = matches!(event, SseEvent::TurnComplete);
            events.push(event);
            if done {
                break;
            }
        }

        assert!(matches!(&events[0], SseEvent::Message { message } if message.text == "Q"));
        assert!(matches!(events[1], SseEvent::StateChange { busy: true }));
        assert!(matches!(&events[2], SseEvent::Message { message } if message.text == "X"));
        assert!(matches!(events[3], SseEvent::TurnComplete));
        let last = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(matches!(last, SseEvent::StateChange { busy: false }));
    }

    #[tokio::test]
    async fn test_manager_sessions_are_independent() {
        let client = Arc::new(MockCompletionClient::new("m"));
        client.queue_reply("for a");
        let manager = RuntimeManager::new(client);

        let a = manager.create_session().await;
        let b = manager.create_session().await;
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(manager.session_count().await, 2);

        a.submit("hello from a").await.unwrap();
        idle(&a).await;

        assert_eq!(a.current_state().messages.len(), 3);
        assert_eq!(b.current_state().messages.len(), 1);

        assert!(manager.get(a.session_id()).await.is_some());
        assert!(manager.close(a.session_id()).await);
        assert!(!manager.close(a.session_id()).await);
        assert!(manager.get(a.session_id()).await.is_none());
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_abandoned_session_is_reaped() {
        let manager = RuntimeManager::new(Arc::new(MockCompletionClient::new("m")));
        let abandoned = manager.create_session().await;
        let watched = manager.create_session().await;
        let _stream = watched.subscribe();

        assert_eq!(manager.reap_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(manager.reap_idle(Duration::ZERO).await, 1);

        assert!(manager.get(abandoned.session_id()).await.is_none());
        assert!(manager.get(watched.session_id()).await.is_some());
    }

    #[tokio::test]
    async fn test_busy_session_is_not_reaped() {
        let client = Arc::new(GatedMockCompletionClient::new("m"));
        client.queue_reply("late");
        let manager = RuntimeManager::new(client.clone());
        let handle = manager.create_session().await;

        handle.submit("still waiting").await.unwrap();
        assert_eq!(manager.reap_idle(Duration::ZERO).await, 0);

        client.release();
        idle(&handle).await;
        assert_eq!(manager.reap_idle(Duration::ZERO).await, 1);
    }

    #[tokio::test]
    async fn test_reaper_sweeps_in_background() {
        let manager = Arc::new(RuntimeManager::new(Arc::new(MockCompletionClient::new(
            "m",
        ))));
        for _ in 0..3 {
            manager.create_session().await;
        }

        manager.spawn_reaper(Duration::from_millis(10), Duration::ZERO);

        timeout(WAIT, async {
            while manager.session_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("sessions were not reaped");
    }
}
