//! Fake devices and transport for voice controller tests

use super::audio::{AudioError, AudioInput, AudioOutput, PcmFrame, PLAYBACK_SAMPLE_RATE};
use super::transport::{LiveConfig, LiveConnector, LiveError, LiveEvent, LiveHandle};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// ============================================================================
// Fake audio devices
// ============================================================================

#[derive(Default)]
pub struct FakeAudioInput {
    deny_permission: bool,
    sender: Mutex<Option<mpsc::Sender<PcmFrame>>>,
    pub stopped: AtomicBool,
}

impl FakeAudioInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self {
            deny_permission: true,
            ..Self::default()
        }
    }

    /// Producer side of the capture channel, once started.
    pub fn capture_tx(&self) -> mpsc::Sender<PcmFrame> {
        self.sender
            .lock()
            .unwrap()
            .clone()
            .expect("capture not started")
    }
}

#[async_trait]
impl AudioInput for FakeAudioInput {
    async fn start(&self) -> Result<mpsc::Receiver<PcmFrame>, AudioError> {
        if self.deny_permission {
            return Err(AudioError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(64);
        *self.sender.lock().unwrap() = Some(tx);
        self.stopped.store(false, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.sender.lock().unwrap().take();
    }
}

#[derive(Default)]
pub struct FakeAudioOutput {
    now: Mutex<f64>,
    pub scheduled: Mutex<Vec<(PcmFrame, f64)>>,
    pub stop_all_calls: AtomicUsize,
    pub closed: AtomicBool,
}

impl FakeAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }

    pub fn starts(&self) -> Vec<f64> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(_, start)| *start)
            .collect()
    }
}

#[async_trait]
impl AudioOutput for FakeAudioOutput {
    async fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }

    async fn play_at(&self, frame: PcmFrame, start: f64) {
        self.scheduled.lock().unwrap().push((frame, start));
    }

    async fn stop_all(&self) {
        self.stop_all_calls.fetch_add(1, Ordering::SeqCst);
        self.scheduled.lock().unwrap().clear();
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Fake live transport
// ============================================================================

#[derive(Default)]
pub struct FakeLiveHandle {
    pub sent_audio: Mutex<Vec<PcmFrame>>,
    pub tool_responses: Mutex<Vec<(String, String, Value)>>,
    pub closed: AtomicBool,
}

#[async_trait]
impl LiveHandle for FakeLiveHandle {
    async fn send_audio(&self, frame: PcmFrame) -> Result<(), LiveError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LiveError::Closed);
        }
        self.sent_audio.lock().unwrap().push(frame);
        Ok(())
    }

    async fn send_tool_response(
        &self,
        id: &str,
        name: &str,
        result: Value,
    ) -> Result<(), LiveError> {
        self.tool_responses
            .lock()
            .unwrap()
            .push((id.to_string(), name.to_string(), result));
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeLiveConnector {
    fail_connect: bool,
    pub handle: Arc<FakeLiveHandle>,
    event_tx: Mutex<Option<mpsc::Sender<LiveEvent>>>,
    pub last_config: Mutex<Option<LiveConfig>>,
}

impl FakeLiveConnector {
    pub fn new() -> Self {
        Self {
            fail_connect: false,
            handle: Arc::new(FakeLiveHandle::default()),
            event_tx: Mutex::new(None),
            last_config: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::new()
        }
    }

    /// Inject a server event into the open session.
    pub async fn emit(&self, event: LiveEvent) {
        let tx = self
            .event_tx
            .lock()
            .unwrap()
            .clone()
            .expect("session not connected");
        tx.send(event).await.expect("event loop stopped");
    }
}

impl Default for FakeLiveConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveConnector for FakeLiveConnector {
    async fn connect(
        &self,
        config: LiveConfig,
    ) -> Result<(Arc<dyn LiveHandle>, mpsc::Receiver<LiveEvent>), LiveError> {
        if self.fail_connect {
            return Err(LiveError::Connect("refused".to_string()));
        }
        *self.last_config.lock().unwrap() = Some(config);
        let (tx, rx) = mpsc::channel(64);
        *self.event_tx.lock().unwrap() = Some(tx);
        Ok((self.handle.clone() as Arc<dyn LiveHandle>, rx))
    }
}

/// Poll `check` until it holds or the timeout elapses.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

/// A half-second playback frame at 24 kHz.
pub fn playback_frame() -> PcmFrame {
    PcmFrame::new(vec![0; 12_000], PLAYBACK_SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::session::{ConnectionStatus, Session};
    use crate::voice::audio::CAPTURE_SAMPLE_RATE;
    use crate::voice::VoiceController;
    use serde_json::json;

    struct Fixture {
        session: Arc<Session>,
        connector: Arc<FakeLiveConnector>,
        input: Arc<FakeAudioInput>,
        output: Arc<FakeAudioOutput>,
        controller: VoiceController,
    }

    fn fixture_with(connector: FakeLiveConnector, input: FakeAudioInput) -> Fixture {
        let session = Session::new(Arc::new(Catalog::seed()));
        let connector = Arc::new(connector);
        let input = Arc::new(input);
        let output = Arc::new(FakeAudioOutput::new());
        let controller = VoiceController::new(
            session.clone(),
            connector.clone(),
            input.clone(),
            output.clone(),
        );
        Fixture {
            session,
            connector,
            input,
            output,
            controller,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeLiveConnector::new(), FakeAudioInput::new())
    }

    async fn status(session: &Session) -> ConnectionStatus {
        session.snapshot().await.voice_status
    }

    /// Async polling for session state, within the usual test deadline.
    async fn eventually_session(
        session: &Session,
        check: impl Fn(&crate::session::SessionSnapshot) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if check(&session.snapshot().await) {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn start_connects_and_stop_releases_everything() {
        let fx = fixture();
        fx.controller.start().await.unwrap();
        assert_eq!(status(&fx.session).await, ConnectionStatus::Connected);

        fx.controller.stop().await;
        assert_eq!(status(&fx.session).await, ConnectionStatus::Idle);
        assert!(fx.connector.handle.closed.load(Ordering::SeqCst));
        assert!(fx.input.stopped.load(Ordering::SeqCst));
        assert!(fx.output.closed.load(Ordering::SeqCst));

        // Double-stop is a no-op.
        fx.controller.stop().await;
        assert_eq!(status(&fx.session).await, ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn mic_permission_denied_reverts_to_idle() {
        let fx = fixture_with(FakeLiveConnector::new(), FakeAudioInput::denying());
        assert!(fx.controller.start().await.is_err());
        assert_eq!(status(&fx.session).await, ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn connect_failure_releases_mic_and_reverts_to_idle() {
        let fx = fixture_with(FakeLiveConnector::failing(), FakeAudioInput::new());
        assert!(fx.controller.start().await.is_err());
        assert_eq!(status(&fx.session).await, ConnectionStatus::Idle);
        assert!(fx.input.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn captured_frames_are_forwarded_to_the_session() {
        let fx = fixture();
        fx.controller.start().await.unwrap();

        let tx = fx.input.capture_tx();
        tx.send(PcmFrame::new(vec![1; 4], CAPTURE_SAMPLE_RATE))
            .await
            .unwrap();
        tx.send(PcmFrame::new(vec![2; 4], CAPTURE_SAMPLE_RATE))
            .await
            .unwrap();

        let handle = fx.connector.handle.clone();
        assert!(eventually(|| handle.sent_audio.lock().unwrap().len() == 2).await);
        assert_eq!(handle.sent_audio.lock().unwrap()[0].samples[0], 1);
    }

    #[tokio::test]
    async fn playback_is_gapless_and_in_order() {
        let fx = fixture();
        fx.controller.start().await.unwrap();
        fx.output.set_now(10.0);

        fx.connector.emit(LiveEvent::Audio(playback_frame())).await;
        fx.connector.emit(LiveEvent::Audio(playback_frame())).await;

        let output = fx.output.clone();
        assert!(eventually(|| output.scheduled.lock().unwrap().len() == 2).await);
        assert_eq!(fx.output.starts(), vec![10.0, 10.5]);
    }

    /// Interruption clears queued frames and rebases the clock: the next
    /// frame starts at the current time, not after the cleared ones.
    #[tokio::test]
    async fn interruption_clears_queue_and_rebases_clock() {
        let fx = fixture();
        fx.controller.start().await.unwrap();
        fx.output.set_now(10.0);

        fx.connector.emit(LiveEvent::Audio(playback_frame())).await;
        fx.connector.emit(LiveEvent::Audio(playback_frame())).await;
        let output = fx.output.clone();
        assert!(eventually(|| output.scheduled.lock().unwrap().len() == 2).await);

        fx.connector.emit(LiveEvent::Interrupted).await;
        assert!(eventually(|| output.stop_all_calls.load(Ordering::SeqCst) == 1).await);
        assert!(fx.output.scheduled.lock().unwrap().is_empty());

        fx.output.set_now(10.2);
        fx.connector.emit(LiveEvent::Audio(playback_frame())).await;
        assert!(eventually(|| output.scheduled.lock().unwrap().len() == 1).await);
        assert_eq!(fx.output.starts(), vec![10.2]);
    }

    #[tokio::test]
    async fn transcripts_grow_in_place_per_speaker() {
        let fx = fixture();
        fx.controller.start().await.unwrap();

        fx.connector
            .emit(LiveEvent::Transcript {
                text: "order met".to_string(),
                is_user: true,
            })
            .await;
        fx.connector
            .emit(LiveEvent::Transcript {
                text: "order metformin".to_string(),
                is_user: true,
            })
            .await;
        fx.connector
            .emit(LiveEvent::Transcript {
                text: "Namaste!".to_string(),
                is_user: false,
            })
            .await;

        assert!(eventually_session(&fx.session, |s| s.transcript.len() == 2).await);
        let transcript = fx.session.snapshot().await.transcript;
        assert_eq!(transcript[0].text, "order metformin");
        assert_eq!(transcript[1].text, "Namaste!");
    }

    #[tokio::test]
    async fn tool_calls_round_trip_on_the_open_session() {
        let fx = fixture();
        fx.controller.start().await.unwrap();

        fx.connector
            .emit(LiveEvent::ToolCall {
                id: "fc-1".to_string(),
                name: "placeOrder".to_string(),
                args: json!({ "medicineName": "Amlodipine", "quantity": 2 }),
            })
            .await;

        let handle = fx.connector.handle.clone();
        assert!(eventually(|| handle.tool_responses.lock().unwrap().len() == 1).await);

        let (id, name, result) = handle.tool_responses.lock().unwrap()[0].clone();
        assert_eq!(id, "fc-1");
        assert_eq!(name, "placeOrder");
        assert_eq!(result["status"], "success");
        assert_eq!(
            fx.session.snapshot().await.draft.medicine.unwrap().name,
            "Amlodipine"
        );
    }

    #[tokio::test]
    async fn remote_close_sets_closed_then_stop_returns_to_idle() {
        let fx = fixture();
        fx.controller.start().await.unwrap();

        fx.connector.emit(LiveEvent::Closed).await;
        assert!(
            eventually_session(&fx.session, |s| s.voice_status == ConnectionStatus::Closed).await
        );

        // Local stop after the remote close still runs full teardown.
        fx.controller.stop().await;
        assert_eq!(status(&fx.session).await, ConnectionStatus::Idle);
        assert!(fx.input.stopped.load(Ordering::SeqCst));
        assert!(fx.output.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn session_config_carries_prompt_and_tools() {
        let fx = fixture();
        fx.controller.start().await.unwrap();
        let config = fx.connector.last_config.lock().unwrap().clone().unwrap();
        assert!(config.system_instruction.contains("SmartRx"));
        assert_eq!(config.tools.len(), 4);
        assert_eq!(config.voice, "Kore");
    }
}
