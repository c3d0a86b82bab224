use super::{EntryStore, StoreError};
use crate::model::{AudioRecording, LogEntry, RecordingPatch, TranscriptionStatus};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory entry store (entry_id → entry).
///
/// Patch and compare-and-set operations run under the write lock, so they
/// are atomic with respect to each other; reads return clones and never
/// observe a half-applied patch.
#[derive(Clone, Default)]
pub struct MemoryEntryStore {
    entries: Arc<RwLock<HashMap<Uuid, LogEntry>>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EntryStore for MemoryEntryStore {
    async fn insert_entry(&self, entry: LogEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get_entry(&self, entry_id: Uuid) -> Result<LogEntry, StoreError> {
        let entries = self.entries.read().await;
        entries
            .get(&entry_id)
            .cloned()
            .ok_or(StoreError::EntryNotFound(entry_id))
    }

    async fn append_recording(
        &self,
        entry_id: Uuid,
        recording: AudioRecording,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&entry_id)
            .ok_or(StoreError::EntryNotFound(entry_id))?;
        entry.recordings.push(recording);
        Ok(())
    }

    async fn update_recording(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
        patch: RecordingPatch,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&entry_id)
            .ok_or(StoreError::EntryNotFound(entry_id))?;
        let recording = entry
            .recordings
            .iter_mut()
            .find(|r| r.id == recording_id)
            .ok_or(StoreError::RecordingNotFound {
                entry_id,
                recording_id,
            })?;
        patch.apply(recording);
        Ok(())
    }

    async fn begin_transcription(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&entry_id)
            .ok_or(StoreError::EntryNotFound(entry_id))?;
        let recording = entry
            .recordings
            .iter_mut()
            .find(|r| r.id == recording_id)
            .ok_or(StoreError::RecordingNotFound {
                entry_id,
                recording_id,
            })?;

        if recording.transcription_status == TranscriptionStatus::Processing {
            return Err(StoreError::AlreadyInProgress(recording_id));
        }

        recording.transcription_status = TranscriptionStatus::Processing;
        Ok(())
    }
}
