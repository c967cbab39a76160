//! HTTP presentation boundary
//!
//! The core exposes the transcript, order draft, active screen, and voice
//! connection status, and accepts user text submission, the mic toggle,
//! address save/cancel, and direct medicine selection. Rendering stays on
//! the client; this layer only moves state.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::TurnHandle;
use crate::session::Session;
use crate::voice::VoiceController;
use std::sync::Arc;

/// Shared application state for the router
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub turn: TurnHandle,
    pub voice: Arc<VoiceController>,
}

impl AppState {
    pub fn new(session: Arc<Session>, turn: TurnHandle, voice: Arc<VoiceController>) -> Self {
        Self {
            session,
            turn,
            voice,
        }
    }
}
