//! Mock model service and runtime integration tests

use crate::catalog::Catalog;
use crate::llm::{ModelError, ModelRequest, ModelResponse, ModelService, TextStream};
use crate::runtime::{TurnHandle, TurnRuntime};
use crate::session::{Session, SessionEvent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Mock model service with queued completions and fragment scripts
pub struct MockModelService {
    completions: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    streams: Mutex<VecDeque<Vec<Result<String, ModelError>>>>,
    /// Record of all completion requests made
    pub requests: Mutex<Vec<ModelRequest>>,
    /// Artificial latency before each completion resolves
    delay: Option<Duration>,
}

impl MockModelService {
    pub fn new() -> Self {
        Self {
            completions: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_completion(&self, response: ModelResponse) {
        self.completions.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_completion_error(&self, error: ModelError) {
        self.completions.lock().unwrap().push_back(Err(error));
    }

    /// Queue the fragment script for the next `stream` call.
    pub fn queue_stream(&self, fragments: Vec<Result<String, ModelError>>) {
        self.streams.lock().unwrap().push_back(fragments);
    }
}

impl Default for MockModelService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for MockModelService {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::network("no mock completion queued")))
    }

    async fn stream(&self, _request: &ModelRequest) -> Result<TextStream, ModelError> {
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::network("no mock stream queued"))?;
        Ok(Box::pin(futures::stream::iter(script)))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// A session with a running runtime and a subscribed event receiver
pub struct TestSession {
    pub session: Arc<Session>,
    pub handle: TurnHandle,
    pub events: broadcast::Receiver<SessionEvent>,
    pub model: Arc<MockModelService>,
}

impl TestSession {
    pub fn start(model: MockModelService) -> Self {
        let session = Session::new(Arc::new(Catalog::seed()));
        let events = session.subscribe();
        let model = Arc::new(model);
        let (event_tx, event_rx) = mpsc::channel(32);
        let runtime =
            TurnRuntime::new(session.clone(), model.clone(), event_rx, event_tx.clone());
        tokio::spawn(runtime.run());
        Self {
            session,
            handle: TurnHandle::new(event_tx),
            events,
            model,
        }
    }

    pub async fn send(&self, text: &str) {
        self.handle.submit_text(text.to_string()).await.unwrap();
    }

    /// Wait until `predicate` matches a broadcast event, within `timeout`.
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        predicate: impl Fn(&SessionEvent) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(event)) if predicate(&event) => return true,
                _ => continue,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentBlock, Usage};
    use crate::screen::Screen;
    use crate::transcript::Speaker;
    use serde_json::json;

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            content: vec![ContentBlock::text(text)],
            usage: Usage::default(),
        }
    }

    fn tool_response(name: &str, args: serde_json::Value) -> ModelResponse {
        ModelResponse {
            content: vec![ContentBlock::tool_use("call-1", name, args)],
            usage: Usage::default(),
        }
    }

    #[tokio::test]
    async fn toolless_turn_streams_text_into_one_message() {
        let model = MockModelService::new();
        model.queue_completion(text_response("Namaste! How can I help?"));

        let mut ts = TestSession::start(model);
        ts.send("hello").await;

        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );

        let snapshot = ts.session.snapshot().await;
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[0].speaker, Speaker::User);
        assert_eq!(snapshot.transcript[1].speaker, Speaker::Assistant);
        assert_eq!(snapshot.transcript[1].text, "Namaste! How can I help?");
    }

    /// The turn request carries the full history, the fixed system
    /// instruction, and all four tool schemas.
    #[tokio::test]
    async fn turn_request_carries_system_and_tools() {
        let model = MockModelService::new();
        model.queue_completion(text_response("hi"));

        let mut ts = TestSession::start(model);
        ts.send("hello").await;
        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );

        let requests = ts.model.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("SmartRx"));
        assert_eq!(requests[0].tools.len(), 4);
        assert_eq!(requests[0].messages.len(), 1);
    }

    /// The order-flow path end to end: "Order Metformin 500mg" issues a
    /// placeOrder call, the draft picks up the Metformin record, the user
    /// confirms, the screen lands on success and the draft clears.
    #[tokio::test]
    async fn order_flow_end_to_end() {
        let model = MockModelService::new();
        model.queue_completion(tool_response(
            "placeOrder",
            json!({ "medicineName": "Metformin", "quantity": 1 }),
        ));
        model.queue_stream(vec![
            Ok("Metformin 500mg added. ".to_string()),
            Ok("Confirm karoon?".to_string()),
        ]);

        let mut ts = TestSession::start(model);
        assert!(ts.session.snapshot().await.draft.medicine.is_none());

        ts.send("Order Metformin 500mg").await;
        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );

        let snapshot = ts.session.snapshot().await;
        assert_eq!(
            snapshot.draft.medicine.as_ref().unwrap().name,
            "Metformin"
        );
        assert_eq!(
            snapshot.transcript.last().unwrap().text,
            "Metformin 500mg added. Confirm karoon?"
        );

        // User confirms.
        ts.session.confirm_order().await.unwrap();
        let snapshot = ts.session.snapshot().await;
        assert_eq!(snapshot.screen, Screen::Success);
        assert!(snapshot.draft.medicine.is_none());
    }

    #[tokio::test]
    async fn tool_exchange_is_recorded_in_model_history() {
        let model = MockModelService::new();
        model.queue_completion(tool_response(
            "checkInventory",
            json!({ "medicineName": "Paracetamol" }),
        ));
        model.queue_stream(vec![Ok("In stock.".to_string())]);

        let mut ts = TestSession::start(model);
        ts.send("is paracetamol available?").await;
        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );

        let history = ts.session.with_state(|s| s.history.clone()).await;
        // user + assistant(tool call) + user(tool result) + assistant(text)
        assert_eq!(history.len(), 4);
        assert!(matches!(
            history[1].content[0],
            ContentBlock::ToolUse { ref name, .. } if name == "checkInventory"
        ));
        assert!(matches!(
            history[2].content[0],
            ContentBlock::ToolResult { ref name, .. } if name == "checkInventory"
        ));
    }

    #[tokio::test]
    async fn message_mid_turn_is_rejected() {
        let model = MockModelService::new().with_delay(Duration::from_millis(300));
        model.queue_completion(text_response("done"));

        let mut ts = TestSession::start(model);
        ts.send("first").await;
        // Give the runtime a beat to enter ModelRequesting.
        tokio::time::sleep(Duration::from_millis(50)).await;
        ts.send("second").await;

        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::Error { .. }
            ))
            .await
        );

        // The first turn still completes.
        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );
        let snapshot = ts.session.snapshot().await;
        let user_messages: Vec<_> = snapshot
            .transcript
            .iter()
            .filter(|m| m.speaker == Speaker::User)
            .collect();
        assert_eq!(user_messages.len(), 1);
    }

    #[tokio::test]
    async fn model_failure_abandons_turn_without_transcript_text() {
        let model = MockModelService::new();
        model.queue_completion_error(ModelError::network("connection reset"));

        let mut ts = TestSession::start(model);
        ts.send("hello").await;

        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnFailed
            ))
            .await
        );

        let snapshot = ts.session.snapshot().await;
        // Only the user message; no assistant error bubble.
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.transcript[0].speaker, Speaker::User);
    }

    #[tokio::test]
    async fn stream_failure_keeps_partial_fragments() {
        let model = MockModelService::new();
        model.queue_completion(tool_response(
            "checkInventory",
            json!({ "medicineName": "Metformin" }),
        ));
        model.queue_stream(vec![
            Ok("Metformin is ".to_string()),
            Err(ModelError::network("stream died")),
        ]);

        let mut ts = TestSession::start(model);
        ts.send("check metformin").await;

        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnFailed
            ))
            .await
        );

        let snapshot = ts.session.snapshot().await;
        assert_eq!(snapshot.transcript.last().unwrap().text, "Metformin is ");
    }

    #[tokio::test]
    async fn invalid_tool_arguments_round_trip_as_error_payloads() {
        let model = MockModelService::new();
        model.queue_completion(tool_response(
            "navigateTo",
            json!({ "screenName": "settings" }),
        ));
        model.queue_stream(vec![Ok("Sorry, I can't open that.".to_string())]);

        let mut ts = TestSession::start(model);
        ts.send("open settings").await;
        assert!(
            ts.wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SessionEvent::TurnCompleted
            ))
            .await
        );

        // Screen untouched; the error payload went back to the model.
        let snapshot = ts.session.snapshot().await;
        assert_eq!(snapshot.screen, Screen::Home);

        let history = ts.session.with_state(|s| s.history.clone()).await;
        let ContentBlock::ToolResult { content, .. } = &history[2].content[0] else {
            panic!("expected tool result in history");
        };
        assert!(content["error"].as_str().unwrap().contains("navigateTo"));
    }
}
