//! Bounded microphone frame queue
//!
//! Capture must never block: frames are pushed into a bounded queue that
//! evicts the oldest frame when full (drop-oldest), and a separate sender
//! task drains the queue onto the network. If network latency exceeds the
//! frame production rate the queue stays bounded and drops are counted.

use crate::voice::audio::PcmFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct FrameQueue {
    frames: Mutex<VecDeque<PcmFrame>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame queue capacity must be non-zero");
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Push a frame without ever blocking the producer. When full, the
    /// oldest frame is evicted and counted as dropped.
    pub fn push(&self, frame: PcmFrame) {
        {
            let mut frames = self.frames.lock().expect("frame queue poisoned");
            if frames.len() == self.capacity {
                frames.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            frames.push_back(frame);
        }
        self.notify.notify_one();
    }

    /// Wait for and take the oldest queued frame.
    pub async fn pop(&self) -> PcmFrame {
        loop {
            if let Some(frame) = self.frames.lock().expect("frame queue poisoned").pop_front()
            {
                return frame;
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().expect("frame queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
