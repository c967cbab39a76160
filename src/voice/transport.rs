//! Live session transport boundary
//!
//! The hosted model's bidirectional audio session, specified by the
//! interface it presents: open a session, send microphone frames and tool
//! responses, receive audio/transcript/tool-call events, close.

use crate::llm::ToolDefinition;
use crate::voice::audio::PcmFrame;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Configuration for opening a live session
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub system_instruction: String,
    pub tools: Vec<ToolDefinition>,
    /// Synthesized voice name (a professional pharmacist voice)
    pub voice: String,
}

impl LiveConfig {
    pub fn pharmacist() -> Self {
        Self {
            system_instruction: crate::system_prompt::SYSTEM_INSTRUCTION.to_string(),
            tools: crate::tools::definitions(),
            voice: "Kore".to_string(),
        }
    }
}

/// Events delivered by the open session, in arrival order
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// Synthesized model audio (24 kHz mono)
    Audio(PcmFrame),
    /// Incremental transcription, tagged with the speaker
    Transcript { text: String, is_user: bool },
    /// The model requested a tool invocation
    ToolCall {
        id: String,
        name: String,
        args: Value,
    },
    /// The model detected the user talking over it
    Interrupted,
    /// The remote side closed the session
    Closed,
}

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("failed to open live session: {0}")]
    Connect(String),
    #[error("live session closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of an open live session
#[async_trait]
pub trait LiveHandle: Send + Sync {
    /// Forward one captured microphone frame.
    async fn send_audio(&self, frame: PcmFrame) -> Result<(), LiveError>;

    /// Return a tool result on the open session, keyed by the call id.
    async fn send_tool_response(
        &self,
        id: &str,
        name: &str,
        result: Value,
    ) -> Result<(), LiveError>;

    /// Close the remote session handle. Idempotent; safe to race a remote
    /// close.
    async fn close(&self);
}

/// Opens live sessions against the hosted model
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(
        &self,
        config: LiveConfig,
    ) -> Result<(Arc<dyn LiveHandle>, mpsc::Receiver<LiveEvent>), LiveError>;
}

/// Placeholder connector for deployments without a live transport: every
/// connect attempt is rejected and the voice status reverts to idle.
pub struct UnconfiguredLive;

#[async_trait]
impl LiveConnector for UnconfiguredLive {
    async fn connect(
        &self,
        _config: LiveConfig,
    ) -> Result<(Arc<dyn LiveHandle>, mpsc::Receiver<LiveEvent>), LiveError> {
        Err(LiveError::Connect(
            "no live transport configured".to_string(),
        ))
    }
}
