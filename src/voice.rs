//! Voice mode: one continuous bidirectional audio session
//!
//! The controller multiplexes outbound microphone frames, inbound
//! synthesized audio, transcription events, and tool calls over a single
//! live session, while staying responsive to interruption. Status machine:
//! idle → connecting → connected → idle (explicit stop) or → closed
//! (remote/error close). Each connect establishes a fresh session.

pub mod audio;
mod capture;
mod playback;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use playback::PlaybackClock;

use crate::session::{ConnectionStatus, Session, SessionEvent};
use crate::state_machine::ToolRequest;
use crate::tools;
use crate::transcript::Speaker;
use audio::{AudioError, AudioInput, AudioOutput};
use capture::FrameQueue;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use transport::{LiveConfig, LiveConnector, LiveError, LiveEvent, LiveHandle};

/// Bounded mic queue: at 4096-sample frames this is ~8 seconds of audio
/// before drop-oldest kicks in.
const MIC_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("microphone unavailable: {0}")]
    Microphone(#[from] AudioError),
    #[error("live session failed: {0}")]
    Connect(#[from] LiveError),
}

struct ActiveVoice {
    handle: Arc<dyn LiveHandle>,
    tasks: Vec<JoinHandle<()>>,
}

/// Owns the live session lifecycle for one session context.
pub struct VoiceController {
    session: Arc<Session>,
    connector: Arc<dyn LiveConnector>,
    input: Arc<dyn AudioInput>,
    output: Arc<dyn AudioOutput>,
    active: Mutex<Option<ActiveVoice>>,
}

impl VoiceController {
    pub fn new(
        session: Arc<Session>,
        connector: Arc<dyn LiveConnector>,
        input: Arc<dyn AudioInput>,
        output: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            session,
            connector,
            input,
            output,
            active: Mutex::new(None),
        }
    }

    /// Open a fresh live session: capture device first (permission), then
    /// the remote session. Any failure reverts the status to idle.
    pub async fn start(&self) -> Result<(), VoiceError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Ok(());
        }

        self.session
            .set_voice_status(ConnectionStatus::Connecting)
            .await;

        let frames = match self.input.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.session.set_voice_status(ConnectionStatus::Idle).await;
                return Err(e.into());
            }
        };

        let (handle, events) = match self.connector.connect(LiveConfig::pharmacist()).await {
            Ok(pair) => pair,
            Err(e) => {
                self.input.stop().await;
                self.session.set_voice_status(ConnectionStatus::Idle).await;
                return Err(e.into());
            }
        };

        self.session
            .set_voice_status(ConnectionStatus::Connected)
            .await;
        tracing::info!(session_id = %self.session.id(), "live session connected");

        let tasks = vec![
            self.spawn_mic_pipeline(frames, Arc::clone(&handle)),
            tokio::spawn(run_event_loop(
                events,
                Arc::clone(&handle),
                Arc::clone(&self.session),
                Arc::clone(&self.output),
            )),
        ];

        *active = Some(ActiveVoice { handle, tasks });
        Ok(())
    }

    /// Stop the session: close the remote handle, release both audio
    /// devices, and clear in-flight playback — all three, even when the
    /// remote close already happened. Double-stop is a no-op.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        let Some(voice) = active.take() else {
            return;
        };

        voice.handle.close().await;
        for task in &voice.tasks {
            task.abort();
        }
        self.input.stop().await;
        self.output.stop_all().await;
        self.output.close().await;

        self.session.set_voice_status(ConnectionStatus::Idle).await;
        tracing::info!(session_id = %self.session.id(), "live session stopped");
    }

    /// Capture pipeline: the producer half pushes into the bounded
    /// drop-oldest queue without ever blocking capture; the sender half
    /// drains it onto the open session.
    fn spawn_mic_pipeline(
        &self,
        mut frames: mpsc::Receiver<audio::PcmFrame>,
        handle: Arc<dyn LiveHandle>,
    ) -> JoinHandle<()> {
        let queue = Arc::new(FrameQueue::new(MIC_QUEUE_CAPACITY));

        let producer_queue = Arc::clone(&queue);
        let producer = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                producer_queue.push(frame);
            }
        });

        tokio::spawn(async move {
            loop {
                let frame = queue.pop().await;
                if let Err(e) = handle.send_audio(frame).await {
                    tracing::debug!(error = %e, "mic forwarding stopped");
                    break;
                }
            }
            producer.abort();
            let dropped = queue.dropped();
            if dropped > 0 {
                tracing::warn!(dropped, "mic frames dropped under backpressure");
            }
        })
    }
}

/// Inbound event loop: playback scheduling, transcription, tool dispatch,
/// interruption, and remote close — processed in arrival order.
async fn run_event_loop(
    mut events: mpsc::Receiver<LiveEvent>,
    handle: Arc<dyn LiveHandle>,
    session: Arc<Session>,
    output: Arc<dyn AudioOutput>,
) {
    let mut clock = playback::PlaybackClock::new();

    while let Some(event) = events.recv().await {
        match event {
            LiveEvent::Audio(frame) => {
                let now = output.now().await;
                let start = clock.schedule(now, frame.duration_secs());
                output.play_at(frame, start).await;
            }

            LiveEvent::Interrupted => {
                // No stale audio may continue: stop sources, drop the
                // pending set, rebase the clock.
                output.stop_all().await;
                clock.reset();
                tracing::debug!(session_id = %session.id(), "playback interrupted");
            }

            LiveEvent::Transcript { text, is_user } => {
                let speaker = if is_user {
                    Speaker::User
                } else {
                    Speaker::Assistant
                };
                let message = session
                    .with_state(|s| {
                        let id = s.transcript.apply_live_text(speaker, &text);
                        s.transcript.get(&id).cloned()
                    })
                    .await;
                if let Some(message) = message {
                    session.broadcast(SessionEvent::TranscriptUpdate { message });
                }
            }

            LiveEvent::ToolCall { id, name, args } => {
                let request = ToolRequest::parse(id, &name, args);
                let result = tools::dispatch(&request, &session).await;
                if let Err(e) = handle
                    .send_tool_response(request.id(), request.name(), result.payload)
                    .await
                {
                    tracing::warn!(error = %e, "failed to return tool result on live session");
                }
            }

            LiveEvent::Closed => {
                session.set_voice_status(ConnectionStatus::Closed).await;
                tracing::info!(session_id = %session.id(), "live session closed by remote");
                break;
            }
        }
    }
}
