//! Pure state transition function
//!
//! Given the same state and event this function always produces the same
//! result, with no I/O. The runtime owns effect execution; ordering
//! guarantees of the turn protocol (one outstanding turn, serial tool
//! execution in returned order) fall out of the transitions below.

use super::state::{ToolRequest, TurnContext, TurnState};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a turn is already in flight")]
    TurnInFlight,
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function for the text-mode turn protocol.
pub fn transition(
    state: &TurnState,
    _context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User message handling
        // ============================================================

        // Idle + UserMessage -> ModelRequesting
        (TurnState::Idle, Event::UserMessage { text }) => {
            Ok(TransitionResult::new(TurnState::ModelRequesting)
                .with_effect(Effect::PushUserMessage { text })
                .with_effect(Effect::RequestModel))
        }

        // A turn is in flight: reject, state unchanged
        (state, Event::UserMessage { .. }) if state.is_busy() => {
            Err(TransitionError::TurnInFlight)
        }

        // ============================================================
        // Model response processing
        // ============================================================

        // No tool requests: deliver the response text as the fragment
        // sequence directly.
        (TurnState::ModelRequesting, Event::ModelResponse { text, requests })
            if requests.is_empty() =>
        {
            Ok(TransitionResult::new(TurnState::Streaming)
                .with_effect(Effect::BeginAssistantMessage)
                .with_effect(Effect::EmitResponseText { text }))
        }

        // Tool requests present: execute serially, in returned order.
        (TurnState::ModelRequesting, Event::ModelResponse { mut requests, .. }) => {
            let current = requests.remove(0);
            Ok(
                TransitionResult::new(TurnState::ToolExecuting {
                    current: current.clone(),
                    remaining: requests,
                })
                .with_effect(Effect::ExecuteTool { request: current }),
            )
        }

        // ============================================================
        // Tool execution
        // ============================================================
        (
            TurnState::ToolExecuting { current, remaining },
            Event::ToolComplete {
                tool_use_id,
                output,
            },
        ) => {
            if tool_use_id != current.id() {
                return Err(TransitionError::InvalidTransition(format!(
                    "tool result for {tool_use_id} but {} is executing",
                    current.id()
                )));
            }

            let exchange = Effect::AppendToolExchange {
                request: current.clone(),
                output,
            };

            match remaining.split_first() {
                Some((next, rest)) => Ok(TransitionResult::new(TurnState::ToolExecuting {
                    current: next.clone(),
                    remaining: rest.to_vec(),
                })
                .with_effect(exchange)
                .with_effect(Effect::ExecuteTool {
                    request: next.clone(),
                })),
                // All tools done: request the narrated follow-up as a
                // fragment stream.
                None => Ok(TransitionResult::new(TurnState::Streaming)
                    .with_effect(exchange)
                    .with_effect(Effect::BeginAssistantMessage)
                    .with_effect(Effect::RequestFollowUpStream)),
            }
        }

        // ============================================================
        // Fragment streaming
        // ============================================================
        (TurnState::Streaming, Event::StreamFragment { text }) => Ok(TransitionResult::new(
            TurnState::Streaming,
        )
        .with_effect(Effect::AppendFragment { text })),

        (TurnState::Streaming, Event::StreamClosed) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effect(Effect::FinalizeAssistantMessage)
            .with_effect(Effect::NotifyTurnCompleted)),

        // ============================================================
        // Failure: the turn is abandoned, no transcript error text
        // ============================================================
        (TurnState::ModelRequesting, Event::ModelFailed { message }) => Ok(TransitionResult::new(
            TurnState::Idle,
        )
        .with_effect(Effect::NotifyTurnFailed { message })),

        // A stream that dies mid-way keeps whatever fragments arrived.
        (TurnState::Streaming, Event::ModelFailed { message }) => {
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::FinalizeAssistantMessage)
                .with_effect(Effect::NotifyTurnFailed { message }))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in {state:?}"
        ))),
    }
}

/// Decode raw (id, name, args) triples from a model response into tool
/// requests, preserving the model's order.
pub fn decode_requests(
    raw: &[(&str, &str, &serde_json::Value)],
) -> Vec<ToolRequest> {
    raw.iter()
        .map(|(id, name, args)| ToolRequest::parse(*id, name, (*args).clone()))
        .collect()
}
