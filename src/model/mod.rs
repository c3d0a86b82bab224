//! Core data model: log entries and their audio recordings.
//!
//! A `LogEntry` owns an ordered list of `AudioRecording` values. Each
//! recording carries its own transcription lifecycle and is addressed by a
//! stable generated id, never by its position in the list (positions shift
//! when recordings are removed). The list order is kept only as a display
//! hint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transcription lifecycle state of a single recording.
///
/// Exactly one variant holds at any time. `Completed` and `Failed` are the
/// terminal states of one attempt; an explicit retry restarts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    NotRequested,
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One uploaded audio artifact plus its transcription lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRecording {
    /// Stable identifier assigned at upload time.
    pub id: Uuid,

    /// Opaque reference to the stored audio bytes (relative path under the
    /// audio storage root).
    pub storage_locator: String,

    pub original_filename: String,
    pub byte_size: u64,
    pub duration_seconds: Option<f64>,
    pub uploaded_at: DateTime<Utc>,

    pub transcription_status: TranscriptionStatus,

    /// Text result of the last successful attempt. Not cleared by a later
    /// failed attempt; `transcription_status` disambiguates staleness.
    pub transcript: Option<String>,

    /// Error message of the last failed attempt.
    pub transcription_error: Option<String>,

    /// When the last terminal state (completed/failed) was reached.
    pub transcription_timestamp: Option<DateTime<Utc>>,

    /// Post-processed transcript, produced on demand. Independent of
    /// `transcript`, which it never replaces.
    pub improved_transcript: Option<String>,
    pub improved_transcript_timestamp: Option<DateTime<Utc>>,

    /// Clinical commentary generated from this recording's transcript.
    pub ai_response: Option<String>,
    pub ai_response_timestamp: Option<DateTime<Utc>>,
}

impl AudioRecording {
    /// Create a freshly uploaded recording in the `NotRequested` state.
    pub fn new(
        storage_locator: String,
        original_filename: String,
        byte_size: u64,
        duration_seconds: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            storage_locator,
            original_filename,
            byte_size,
            duration_seconds,
            uploaded_at: Utc::now(),
            transcription_status: TranscriptionStatus::NotRequested,
            transcript: None,
            transcription_error: None,
            transcription_timestamp: None,
            improved_transcript: None,
            improved_transcript_timestamp: None,
            ai_response: None,
            ai_response_timestamp: None,
        }
    }
}

/// A single recorded clinical activity, owner of zero or more recordings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,

    /// Tenant that owns this entry. Ownership checks against the
    /// authenticated principal happen upstream of this crate.
    pub client_id: String,

    pub title: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Insertion order is display order only; all transcription operations
    /// address recordings by id.
    pub recordings: Vec<AudioRecording>,
}

impl LogEntry {
    pub fn new(client_id: String, title: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            title,
            created_at: Utc::now(),
            recordings: Vec::new(),
        }
    }

    pub fn recording(&self, recording_id: Uuid) -> Option<&AudioRecording> {
        self.recordings.iter().find(|r| r.id == recording_id)
    }
}

/// Field-scoped update applied to exactly one recording.
///
/// Only the fields that are `Some` (plus the explicit clear flag) are
/// written; sibling recordings and entry metadata are untouched. This is the
/// only way transcription results are persisted, so two workers handling
/// different recordings of the same entry cannot clobber each other.
#[derive(Debug, Clone, Default)]
pub struct RecordingPatch {
    pub status: Option<TranscriptionStatus>,
    pub transcript: Option<String>,
    pub transcription_error: Option<String>,
    /// Clears `transcription_error`; used by the completed transition.
    pub clear_error: bool,
    pub transcription_timestamp: Option<DateTime<Utc>>,
    pub improved_transcript: Option<String>,
    pub improved_transcript_timestamp: Option<DateTime<Utc>>,
    pub ai_response: Option<String>,
    pub ai_response_timestamp: Option<DateTime<Utc>>,
}

impl RecordingPatch {
    /// Transition into `Completed` with a fresh transcript.
    pub fn completed(transcript: String) -> Self {
        Self {
            status: Some(TranscriptionStatus::Completed),
            transcript: Some(transcript),
            clear_error: true,
            transcription_timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Transition into `Failed` with the attempt's error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TranscriptionStatus::Failed),
            transcription_error: Some(error.into()),
            transcription_timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Re-enter `Processing` for a fresh attempt. Leaves the previous
    /// transcript and error in place; they are overwritten only by the next
    /// terminal transition.
    pub fn processing() -> Self {
        Self {
            status: Some(TranscriptionStatus::Processing),
            ..Self::default()
        }
    }

    pub fn improved(text: String) -> Self {
        Self {
            improved_transcript: Some(text),
            improved_transcript_timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Apply this patch to a recording in place.
    pub fn apply(&self, recording: &mut AudioRecording) {
        if let Some(status) = self.status {
            recording.transcription_status = status;
        }
        if let Some(transcript) = &self.transcript {
            recording.transcript = Some(transcript.clone());
        }
        if self.clear_error {
            recording.transcription_error = None;
        }
        if let Some(error) = &self.transcription_error {
            recording.transcription_error = Some(error.clone());
        }
        if let Some(ts) = self.transcription_timestamp {
            recording.transcription_timestamp = Some(ts);
        }
        if let Some(text) = &self.improved_transcript {
            recording.improved_transcript = Some(text.clone());
        }
        if let Some(ts) = self.improved_transcript_timestamp {
            recording.improved_transcript_timestamp = Some(ts);
        }
        if let Some(text) = &self.ai_response {
            recording.ai_response = Some(text.clone());
        }
        if let Some(ts) = self.ai_response_timestamp {
            recording.ai_response_timestamp = Some(ts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_patch_clears_previous_error() {
        let mut rec = AudioRecording::new("a/b.mp3".into(), "b.mp3".into(), 10, None);
        RecordingPatch::failed("backend unreachable").apply(&mut rec);
        assert_eq!(rec.transcription_status, TranscriptionStatus::Failed);
        assert!(rec.transcription_error.is_some());

        RecordingPatch::completed("hello".into()).apply(&mut rec);
        assert_eq!(rec.transcription_status, TranscriptionStatus::Completed);
        assert_eq!(rec.transcript.as_deref(), Some("hello"));
        assert!(rec.transcription_error.is_none());
    }

    #[test]
    fn processing_patch_keeps_terminal_fields() {
        let mut rec = AudioRecording::new("a/b.mp3".into(), "b.mp3".into(), 10, None);
        RecordingPatch::completed("first attempt".into()).apply(&mut rec);

        RecordingPatch::processing().apply(&mut rec);
        assert_eq!(rec.transcription_status, TranscriptionStatus::Processing);
        assert_eq!(rec.transcript.as_deref(), Some("first attempt"));
    }

    #[test]
    fn improved_patch_never_touches_transcript() {
        let mut rec = AudioRecording::new("a/b.mp3".into(), "b.mp3".into(), 10, None);
        RecordingPatch::completed("raw text".into()).apply(&mut rec);
        RecordingPatch::improved("## Sections\nraw text".into()).apply(&mut rec);

        assert_eq!(rec.transcript.as_deref(), Some("raw text"));
        assert_eq!(
            rec.improved_transcript.as_deref(),
            Some("## Sections\nraw text")
        );
    }
}
