//! Core turn state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the text-mode turn protocol (model request, sequential tool execution,
//! streamed follow-up) is a pure function over states and events that
//! returns effects for the runtime to execute.

mod effect;
pub mod event;
mod state;
mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{
    CheckInventoryInput, NavigateToInput, PlaceOrderInput, ToolCall, ToolDecodeError, ToolInput,
    ToolRequest, TurnContext, TurnState,
};
pub use transition::{decode_requests, transition, TransitionError, TransitionResult};
