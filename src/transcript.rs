//! Conversation transcript with growable messages
//!
//! Both transports stream text incrementally: the typed chat appends
//! fragments to the in-flight assistant message, and the voice session
//! delivers rolling transcriptions per speaker. Either way the same
//! message record is mutated in place as text arrives — a message's
//! identity never changes while it grows, and fragments never create
//! duplicate entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// Stable identifier for a transcript message
pub type MessageId = String;

/// One transcript entry. `text` grows in place while the message is
/// streaming; `id` and `created_at` are fixed at creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub id: MessageId,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only ordered message log
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a completed user message.
    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Speaker::User, text.into())
    }

    /// Start an empty assistant message to stream fragments into.
    pub fn begin_assistant(&mut self) -> MessageId {
        self.push(Speaker::Assistant, String::new())
    }

    /// Append a fragment to an in-flight message. The message keeps its
    /// identity; unknown ids are ignored (the turn was abandoned).
    pub fn append_fragment(&mut self, id: &str, fragment: &str) {
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            msg.text.push_str(fragment);
        }
    }

    /// Apply a live-transport transcription event. Consecutive events from
    /// the same speaker as the latest message replace that message's text
    /// (the transport sends rolling snapshots); a speaker change starts a
    /// new message. Returns the id of the affected message.
    pub fn apply_live_text(&mut self, speaker: Speaker, text: &str) -> MessageId {
        match self.messages.last_mut() {
            Some(last) if last.speaker == speaker => {
                last.text = text.to_string();
                last.id.clone()
            }
            _ => self.push(speaker, text.to_string()),
        }
    }

    /// The message with the given id, if present.
    pub fn get(&self, id: &str) -> Option<&TranscriptMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Text of the message with the given id, if present.
    pub fn text_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|m| m.text.as_str())
    }

    fn push(&mut self, speaker: Speaker, text: String) -> MessageId {
        let id = uuid::Uuid::new_v4().to_string();
        self.messages.push(TranscriptMessage {
            id: id.clone(),
            speaker,
            text,
            created_at: Utc::now(),
        });
        id
    }
}
