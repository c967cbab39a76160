//! Events that drive the turn state machine

use crate::state_machine::state::ToolRequest;
use crate::tools::ToolOutput;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// User submitted a chat message
    UserMessage { text: String },

    /// The turn request came back from the model
    ModelResponse {
        /// Text content of the response (delivered as fragments when no
        /// tools were requested)
        text: String,
        /// Decoded tool requests, in the order the model returned them
        requests: Vec<ToolRequest>,
    },

    /// The model request or the fragment stream failed
    ModelFailed { message: String },

    /// One tool finished executing
    ToolComplete {
        tool_use_id: String,
        output: ToolOutput,
    },

    /// A fragment of the narrated follow-up arrived
    StreamFragment { text: String },

    /// The fragment sequence finished
    StreamClosed,
}
