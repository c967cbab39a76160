//! Audio device boundary
//!
//! Capture runs at 16 kHz mono, playback at 24 kHz mono, both as raw PCM
//! frames. Devices are trait seams: the core schedules and forwards frames
//! but never touches hardware directly.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// A raw PCM buffer of mono samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl PcmFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Wall-clock duration of the frame at its sample rate, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("audio device error: {0}")]
    Device(String),
}

/// Microphone capture device
#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Open the device and start producing fixed-size frames. Fails when
    /// the user denies microphone permission.
    async fn start(&self) -> Result<mpsc::Receiver<PcmFrame>, AudioError>;

    /// Release the device. Idempotent.
    async fn stop(&self);
}

/// Speaker playback device with a monotonic output clock
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Current position of the output clock, in seconds.
    async fn now(&self) -> f64;

    /// Schedule a frame to start at `start` seconds on the output clock.
    async fn play_at(&self, frame: PcmFrame, start: f64);

    /// Stop every playing and scheduled source. Idempotent.
    async fn stop_all(&self);

    /// Release the device. Idempotent.
    async fn close(&self);
}

/// Capture device for hosts with no microphone: every start attempt is
/// rejected, which surfaces as a failed connect.
pub struct UnavailableInput;

#[async_trait]
impl AudioInput for UnavailableInput {
    async fn start(&self) -> Result<mpsc::Receiver<PcmFrame>, AudioError> {
        Err(AudioError::Device(
            "no capture device on this host".to_string(),
        ))
    }

    async fn stop(&self) {}
}

/// Playback device for hosts with no speaker: frames are dropped.
pub struct UnavailableOutput;

#[async_trait]
impl AudioOutput for UnavailableOutput {
    async fn now(&self) -> f64 {
        0.0
    }

    async fn play_at(&self, _frame: PcmFrame, _start: f64) {}

    async fn stop_all(&self) {}

    async fn close(&self) {}
}
