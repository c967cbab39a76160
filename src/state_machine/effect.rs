//! Effects produced by state transitions

use crate::state_machine::state::ToolRequest;
use crate::tools::ToolOutput;

/// Effects to be executed by the runtime after a state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append the user's message to the transcript and model history
    PushUserMessage { text: String },

    /// Send the turn request (full history + system instruction + tool
    /// schemas) to the model
    RequestModel,

    /// Execute one tool request and report completion
    ExecuteTool { request: ToolRequest },

    /// Append the synthetic tool round-trip (the model's call and the
    /// dispatcher's result) to the model history
    AppendToolExchange {
        request: ToolRequest,
        output: ToolOutput,
    },

    /// Start an empty assistant transcript message to stream into
    BeginAssistantMessage,

    /// Deliver already-received response text through the fragment path
    EmitResponseText { text: String },

    /// Open the follow-up fragment stream after tool execution
    RequestFollowUpStream,

    /// Append a fragment to the in-flight assistant message
    AppendFragment { text: String },

    /// Seal the in-flight assistant message and record it in history
    FinalizeAssistantMessage,

    /// Signal turn completion to the presentation layer
    NotifyTurnCompleted,

    /// Signal an abandoned turn (logged; no transcript error text)
    NotifyTurnFailed { message: String },
}
