//! Runtime for executing text-mode turns
//!
//! The runtime owns the turn state machine and the session it mutates.
//! Events arrive on an mpsc channel (user messages from the API, model
//! responses and stream fragments from spawned request tasks); each event
//! goes through the pure transition function and the resulting effects are
//! executed here.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::TurnRuntime;

use crate::state_machine::Event;
use tokio::sync::mpsc;

/// Handle for feeding events into a running turn runtime
#[derive(Clone)]
pub struct TurnHandle {
    event_tx: mpsc::Sender<Event>,
}

impl TurnHandle {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }

    /// Queue a user chat message. Rejection of mid-turn submissions
    /// happens in the state machine and is broadcast to clients.
    pub async fn submit_text(&self, text: String) -> Result<(), String> {
        self.event_tx
            .send(Event::UserMessage { text })
            .await
            .map_err(|e| format!("session runtime stopped: {e}"))
    }
}
