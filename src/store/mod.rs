//! Entry persistence.
//!
//! The store is the seam between the transcription pipeline and whatever
//! database backs the logbook. Recording updates are field-scoped: a patch
//! addresses one recording by id and writes only the fields it carries, so
//! concurrent workers on sibling recordings of the same entry never clobber
//! each other.

mod memory;

pub use memory::MemoryEntryStore;

use crate::model::{LogEntry, RecordingPatch};
use anyhow::Result;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("log entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("recording {recording_id} not found on entry {entry_id}")]
    RecordingNotFound {
        entry_id: Uuid,
        recording_id: Uuid,
    },

    #[error("transcription already in progress for recording {0}")]
    AlreadyInProgress(Uuid),
}

/// Persistence for log entries and their recording sub-documents.
#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    async fn insert_entry(&self, entry: LogEntry) -> Result<()>;

    /// Fetch a fresh copy of an entry. Workers call this instead of trusting
    /// state captured at enqueue time.
    async fn get_entry(&self, entry_id: Uuid) -> Result<LogEntry, StoreError>;

    /// Append a recording to the end of an entry's list.
    async fn append_recording(
        &self,
        entry_id: Uuid,
        recording: crate::model::AudioRecording,
    ) -> Result<(), StoreError>;

    /// Apply a field-scoped patch to exactly one recording.
    async fn update_recording(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
        patch: RecordingPatch,
    ) -> Result<(), StoreError>;

    /// Atomically transition a recording into `Processing`, failing with
    /// `AlreadyInProgress` if it is already there. This is the
    /// compare-and-set guard against re-entrant transcription: two
    /// near-simultaneous retries cannot both pass it.
    async fn begin_transcription(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
    ) -> Result<(), StoreError>;
}
