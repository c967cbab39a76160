//! Turn states and strongly typed tool inputs

use crate::screen::Screen;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Tool Input Types - Strongly typed inputs for each tool
// ============================================================================

/// Input for the `checkInventory` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckInventoryInput {
    pub medicine_name: String,
}

/// Input for the `placeOrder` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaceOrderInput {
    pub medicine_name: String,
    pub quantity: u32,
}

/// Input for the `navigateTo` tool. The screen name is parsed against the
/// closed screen set during decode, so an out-of-domain name never reaches
/// dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavigateToInput {
    pub screen_name: Screen,
}

/// Strongly typed tool input enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tool", rename_all = "camelCase")]
pub enum ToolInput {
    GetUserHistory,
    CheckInventory(CheckInventoryInput),
    PlaceOrder(PlaceOrderInput),
    NavigateTo(NavigateToInput),
}

impl ToolInput {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolInput::GetUserHistory => "getUserHistory",
            ToolInput::CheckInventory(_) => "checkInventory",
            ToolInput::PlaceOrder(_) => "placeOrder",
            ToolInput::NavigateTo(_) => "navigateTo",
        }
    }

    /// The argument record as the model sent it (for history records).
    pub fn to_value(&self) -> Value {
        match self {
            ToolInput::GetUserHistory => Value::Object(serde_json::Map::new()),
            ToolInput::CheckInventory(input) => {
                serde_json::to_value(input).unwrap_or(Value::Null)
            }
            ToolInput::PlaceOrder(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::NavigateTo(input) => serde_json::to_value(input).unwrap_or(Value::Null),
        }
    }

    /// Strict decode from a tool name and argument record. Unknown names
    /// and malformed or out-of-domain arguments are errors, never a
    /// passthrough.
    pub fn from_name_and_value(name: &str, value: Value) -> Result<Self, ToolDecodeError> {
        let decoded = match name {
            "getUserHistory" => Ok(ToolInput::GetUserHistory),
            "checkInventory" => {
                serde_json::from_value(value).map(ToolInput::CheckInventory)
            }
            "placeOrder" => serde_json::from_value(value).map(ToolInput::PlaceOrder),
            "navigateTo" => serde_json::from_value(value).map(ToolInput::NavigateTo),
            _ => {
                return Err(ToolDecodeError {
                    name: name.to_string(),
                    message: "unknown tool".to_string(),
                })
            }
        };
        decoded.map_err(|e| ToolDecodeError {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// A tool argument record the model sent that failed strict decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid arguments for {name}: {message}")]
pub struct ToolDecodeError {
    pub name: String,
    pub message: String,
}

// ============================================================================
// Tool Requests - what the model asked for, decoded or not
// ============================================================================

/// A tool call from the model with typed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, input: ToolInput) -> Self {
        Self {
            id: id.into(),
            input,
        }
    }

    pub fn name(&self) -> &'static str {
        self.input.tool_name()
    }
}

/// Outcome of the strict decode step for one requested call. Invalid
/// requests still flow through execution so the model receives an error
/// payload keyed by the call id, but they never touch session state.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Valid(ToolCall),
    Invalid {
        id: String,
        name: String,
        /// The argument record as sent, kept for the history record
        args: Value,
        error: String,
    },
}

impl ToolRequest {
    /// Decode one requested call from the model's wire form.
    pub fn parse(id: impl Into<String>, name: &str, args: Value) -> Self {
        let id = id.into();
        match ToolInput::from_name_and_value(name, args.clone()) {
            Ok(input) => ToolRequest::Valid(ToolCall { id, input }),
            Err(e) => ToolRequest::Invalid {
                id,
                name: name.to_string(),
                args,
                error: e.message,
            },
        }
    }

    /// The argument record for history records.
    pub fn args(&self) -> Value {
        match self {
            ToolRequest::Valid(call) => call.input.to_value(),
            ToolRequest::Invalid { args, .. } => args.clone(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ToolRequest::Valid(call) => &call.id,
            ToolRequest::Invalid { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolRequest::Valid(call) => call.name(),
            ToolRequest::Invalid { name, .. } => name,
        }
    }
}

// ============================================================================
// Turn State
// ============================================================================

/// State of the text-mode turn protocol
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TurnState {
    /// Ready for user input, no turn in flight
    #[default]
    Idle,

    /// Turn request sent to the model, response pending
    ModelRequesting,

    /// Executing the model's tool requests serially, in returned order
    ToolExecuting {
        current: ToolRequest,
        remaining: Vec<ToolRequest>,
    },

    /// Fragment sequence in flight, appending to the assistant message
    Streaming,
}

impl TurnState {
    /// Whether a turn is in flight. New user messages are rejected while
    /// busy: exactly one outstanding turn at a time.
    pub fn is_busy(&self) -> bool {
        !matches!(self, TurnState::Idle)
    }
}

/// Immutable configuration for a session's turn machine
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
}

impl TurnContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
