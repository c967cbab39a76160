//! Session context: the mutable state of one assistant session
//!
//! Everything a session mutates lives behind one explicit context object
//! (order draft, transcript, active screen, model-visible history) instead
//! of ambient globals, so components receive the session they act on and
//! additional sessions remain possible.

use crate::catalog::Catalog;
use crate::llm::ModelMessage;
use crate::order::{Address, OrderDraft};
use crate::profile::{ProfileError, UserProfile};
use crate::screen::Screen;
use crate::transcript::{Transcript, TranscriptMessage};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Connection status of the voice session, surfaced to the presentation
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Closed,
}

/// Events broadcast to connected presentation clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A transcript message was created or grew; carries the full record
    /// so clients update in place by id.
    TranscriptUpdate { message: TranscriptMessage },
    ScreenChanged { screen: Screen },
    DraftUpdated { draft: OrderDraft },
    VoiceStatus { status: ConnectionStatus },
    TurnCompleted,
    /// The turn was abandoned. Details are logged, not surfaced.
    TurnFailed,
    /// A user action was rejected (e.g. message submitted mid-turn).
    Error { message: String },
}

/// Mutable session state, owned by the session and mutated only through it
#[derive(Debug)]
pub struct SessionState {
    pub draft: OrderDraft,
    pub screen: Screen,
    pub transcript: Transcript,
    /// Model-visible history for the text turn protocol
    pub history: Vec<ModelMessage>,
    pub voice_status: ConnectionStatus,
}

impl SessionState {
    fn new() -> Self {
        Self {
            draft: OrderDraft::new(),
            screen: Screen::Home,
            transcript: Transcript::new(),
            history: Vec::new(),
            voice_status: ConnectionStatus::Idle,
        }
    }
}

/// Snapshot of session state for the presentation boundary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub transcript: Vec<TranscriptMessage>,
    pub draft: OrderDraft,
    pub screen: Screen,
    pub voice_status: ConnectionStatus,
}

/// One assistant session: catalog reference, mutable state, and the
/// broadcast channel presentation clients subscribe to.
pub struct Session {
    id: String,
    catalog: Arc<Catalog>,
    state: RwLock<SessionState>,
    profile: RwLock<UserProfile>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>) -> Arc<Self> {
        let (events, _) = broadcast::channel(128);
        Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            catalog,
            state: RwLock::new(SessionState::new()),
            profile: RwLock::new(UserProfile::seed()),
            events,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn broadcast(&self, event: SessionEvent) {
        // Send fails only when no client is subscribed, which is fine.
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            transcript: state.transcript.messages().to_vec(),
            draft: state.draft.clone(),
            screen: state.screen,
            voice_status: state.voice_status,
        }
    }

    /// Run a closure against the mutable state. All writers funnel through
    /// here; the lock scope never spans an await.
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Set the active screen. Idempotent: navigating to the current screen
    /// changes nothing and broadcasts nothing.
    pub async fn navigate(&self, screen: Screen) -> bool {
        let changed = self
            .with_state(|s| {
                if s.screen == screen {
                    false
                } else {
                    s.screen = screen;
                    true
                }
            })
            .await;
        if changed {
            tracing::debug!(session_id = %self.id, screen = %screen, "screen changed");
            self.broadcast(SessionEvent::ScreenChanged { screen });
        }
        changed
    }

    // ------------------------------------------------------------------
    // Order flow
    // ------------------------------------------------------------------

    /// Direct medicine selection from the presentation layer.
    pub async fn select_medicine(&self, medicine: crate::catalog::Medicine) {
        let draft = self
            .with_state(|s| {
                s.draft.set_medicine(medicine);
                s.draft.clone()
            })
            .await;
        self.broadcast(SessionEvent::DraftUpdated { draft });
    }

    pub async fn set_quantity(&self, quantity: u32) {
        let draft = self
            .with_state(|s| {
                s.draft.set_quantity(quantity);
                s.draft.clone()
            })
            .await;
        self.broadcast(SessionEvent::DraftUpdated { draft });
    }

    /// Confirm the draft: clears the medicine and lands on the success
    /// screen. Fails if no medicine or no address is present.
    pub async fn confirm_order(&self) -> Result<(), OrderFlowError> {
        let (needs_rx, finalized, draft) = self
            .with_state(|s| {
                let needs_rx = s.draft.needs_prescription();
                (needs_rx, s.draft.finalize(), s.draft.clone())
            })
            .await;
        let Some(medicine) = finalized else {
            return Err(OrderFlowError::NotConfirmable);
        };

        // Prescription possession is advisory: surfaced, never a hard gate.
        tracing::info!(
            session_id = %self.id,
            medicine = %medicine.name,
            prescription_required = needs_rx,
            "order confirmed"
        );
        self.broadcast(SessionEvent::DraftUpdated { draft });
        self.navigate(Screen::Success).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Address flow
    // ------------------------------------------------------------------

    /// Save a validated shipping address onto the draft and return to the
    /// chat screen.
    pub async fn save_address(&self, address: Address) -> Result<(), OrderFlowError> {
        if !address.is_valid() {
            return Err(OrderFlowError::InvalidAddress(address.validate()));
        }
        let draft = self
            .with_state(|s| {
                s.draft.address = Some(address);
                s.draft.clone()
            })
            .await;
        self.broadcast(SessionEvent::DraftUpdated { draft });
        self.navigate(Screen::Chat).await;
        Ok(())
    }

    /// Abandon the address editor and return to the chat screen.
    pub async fn cancel_address(&self) {
        self.navigate(Screen::Chat).await;
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub async fn profile(&self) -> UserProfile {
        self.profile.read().await.clone()
    }

    pub async fn add_profile_address(&self, address: Address) -> Result<(), ProfileError> {
        self.profile.write().await.add_address(address)
    }

    pub async fn update_profile_address(
        &self,
        index: usize,
        address: Address,
    ) -> Result<(), ProfileError> {
        self.profile.write().await.update_address(index, address)
    }

    pub async fn delete_profile_address(&self, index: usize) -> Result<(), ProfileError> {
        self.profile.write().await.delete_address(index)
    }

    // ------------------------------------------------------------------
    // Voice status
    // ------------------------------------------------------------------

    pub async fn set_voice_status(&self, status: ConnectionStatus) {
        let changed = self
            .with_state(|s| {
                if s.voice_status == status {
                    false
                } else {
                    s.voice_status = status;
                    true
                }
            })
            .await;
        if changed {
            self.broadcast(SessionEvent::VoiceStatus { status });
        }
    }
}

/// Order-flow failures surfaced to the presentation layer
#[derive(Debug, thiserror::Error)]
pub enum OrderFlowError {
    #[error("draft is missing a medicine or address")]
    NotConfirmable,
    #[error("address failed validation")]
    InvalidAddress(crate::order::AddressValidation),
}
