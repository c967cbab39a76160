//! Turn runtime executor

use crate::llm::{ContentBlock, MessageRole, ModelMessage, ModelRequest, ModelService};
use crate::session::{Session, SessionEvent};
use crate::state_machine::{
    decode_requests, transition, Effect, Event, ToolRequest, TurnContext, TurnState,
};
use crate::system_prompt::SYSTEM_INSTRUCTION;
use crate::tools::{self, ToolOutput};
use crate::transcript::MessageId;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs the text-mode turn protocol for one session.
pub struct TurnRuntime<M: ModelService + 'static> {
    context: TurnContext,
    state: TurnState,
    session: Arc<Session>,
    model: Arc<M>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    /// Id of the assistant transcript message fragments append to
    streaming_message: Option<MessageId>,
}

impl<M: ModelService + 'static> TurnRuntime<M> {
    pub fn new(
        session: Arc<Session>,
        model: M,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            context: TurnContext::new(session.id().to_string()),
            state: TurnState::Idle,
            session,
            model: Arc::new(model),
            event_rx,
            event_tx,
            streaming_message: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "starting turn runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event).await;
        }

        tracing::info!(session_id = %self.context.session_id, "turn runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        // Chained effects can generate follow-on events (tool completions,
        // static-text fragments); process them in order without recursion.
        let mut pending = std::collections::VecDeque::new();
        pending.push_back(event);

        while let Some(current) = pending.pop_front() {
            let result = match transition(&self.state, &self.context, current) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "event rejected"
                    );
                    self.session.broadcast(SessionEvent::Error {
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            self.state = result.new_state;
            for effect in result.effects {
                pending.extend(self.execute_effect(effect).await);
            }
        }
    }

    async fn execute_effect(&mut self, effect: Effect) -> Vec<Event> {
        match effect {
            Effect::PushUserMessage { text } => {
                let message = self
                    .session
                    .with_state(|s| {
                        let id = s.transcript.push_user(text.clone());
                        s.history.push(ModelMessage::user_text(text));
                        s.transcript.get(&id).cloned()
                    })
                    .await;
                if let Some(message) = message {
                    self.session
                        .broadcast(SessionEvent::TranscriptUpdate { message });
                }
                vec![]
            }

            Effect::RequestModel => {
                let request = self.build_request().await;
                let model = Arc::clone(&self.model);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let event = match model.complete(&request).await {
                        Ok(response) => Event::ModelResponse {
                            text: response.text(),
                            requests: decode_requests(&response.tool_calls()),
                        },
                        Err(e) => Event::ModelFailed {
                            message: e.to_string(),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
                vec![]
            }

            Effect::ExecuteTool { request } => {
                let output = tools::dispatch(&request, &self.session).await;
                vec![Event::ToolComplete {
                    tool_use_id: request.id().to_string(),
                    output,
                }]
            }

            Effect::AppendToolExchange { request, output } => {
                self.append_tool_exchange(&request, output).await;
                vec![]
            }

            Effect::BeginAssistantMessage => {
                let message = self
                    .session
                    .with_state(|s| {
                        let id = s.transcript.begin_assistant();
                        let message = s.transcript.get(&id).cloned();
                        (id, message)
                    })
                    .await;
                self.streaming_message = Some(message.0);
                if let Some(message) = message.1 {
                    self.session
                        .broadcast(SessionEvent::TranscriptUpdate { message });
                }
                vec![]
            }

            Effect::EmitResponseText { text } => {
                // Already-received text re-enters the fragment path so the
                // growable-message invariant holds on every delivery route.
                vec![Event::StreamFragment { text }, Event::StreamClosed]
            }

            Effect::RequestFollowUpStream => {
                let request = self.build_request().await;
                let model = Arc::clone(&self.model);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    match model.stream(&request).await {
                        Ok(mut fragments) => {
                            while let Some(item) = fragments.next().await {
                                let event = match item {
                                    Ok(text) => Event::StreamFragment { text },
                                    Err(e) => {
                                        let _ = event_tx
                                            .send(Event::ModelFailed {
                                                message: e.to_string(),
                                            })
                                            .await;
                                        return;
                                    }
                                };
                                if event_tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                            let _ = event_tx.send(Event::StreamClosed).await;
                        }
                        Err(e) => {
                            let _ = event_tx
                                .send(Event::ModelFailed {
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
                vec![]
            }

            Effect::AppendFragment { text } => {
                if let Some(id) = self.streaming_message.clone() {
                    let message = self
                        .session
                        .with_state(|s| {
                            s.transcript.append_fragment(&id, &text);
                            s.transcript.get(&id).cloned()
                        })
                        .await;
                    if let Some(message) = message {
                        self.session
                            .broadcast(SessionEvent::TranscriptUpdate { message });
                    }
                }
                vec![]
            }

            Effect::FinalizeAssistantMessage => {
                if let Some(id) = self.streaming_message.take() {
                    self.session
                        .with_state(|s| {
                            if let Some(text) = s.transcript.text_of(&id) {
                                if !text.is_empty() {
                                    let text = text.to_string();
                                    s.history.push(ModelMessage::assistant_text(text));
                                }
                            }
                        })
                        .await;
                }
                vec![]
            }

            Effect::NotifyTurnCompleted => {
                self.session.broadcast(SessionEvent::TurnCompleted);
                vec![]
            }

            Effect::NotifyTurnFailed { message } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    error = %message,
                    "turn abandoned"
                );
                self.session.broadcast(SessionEvent::TurnFailed);
                vec![]
            }
        }
    }

    /// Full history plus the fixed system instruction and tool schemas.
    async fn build_request(&self) -> ModelRequest {
        let messages = self.session.with_state(|s| s.history.clone()).await;
        ModelRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            messages,
            tools: tools::definitions(),
            max_tokens: Some(2048),
        }
    }

    /// Record the synthetic tool round-trip: the model's call as an
    /// assistant message, the dispatcher's result as a user-side tool
    /// response, both keyed by the call id.
    async fn append_tool_exchange(&self, request: &ToolRequest, output: ToolOutput) {
        let call_block = ContentBlock::tool_use(request.id(), request.name(), request.args());
        let result_block =
            ContentBlock::tool_result(request.id(), request.name(), output.payload);

        self.session
            .with_state(|s| {
                s.history.push(ModelMessage {
                    role: MessageRole::Assistant,
                    content: vec![call_block],
                });
                s.history.push(ModelMessage {
                    role: MessageRole::User,
                    content: vec![result_block],
                });
            })
            .await;
    }
}
