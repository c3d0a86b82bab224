use super::TranscribeError;
use crate::backend::{AudioParams, GenerativeBackend, SpeechBackend};
use crate::model::{LogEntry, RecordingPatch, TranscriptionStatus};
use crate::queue::{FailedJob, FailedJobLog, JobQueue};
use crate::storage::AudioStorage;
use crate::store::{EntryStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// System prompt for the transcript post-processor. The backend is asked to
/// restructure, not to invent; that contract cannot be verified here.
pub(super) const IMPROVE_SYSTEM_PROMPT: &str = "You restructure raw clinical voice transcripts \
into clean markdown with sections for context, findings, actions and follow-up. Preserve every \
clinical detail exactly as dictated. Do not add facts, diagnoses or recommendations that are \
not in the transcript.";

/// What a status poll returns for one recording.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionStatusView {
    pub transcription_status: TranscriptionStatus,
    pub transcript: Option<String>,
    pub transcription_error: Option<String>,
    pub transcription_timestamp: Option<DateTime<Utc>>,
}

/// The transcription pipeline, shared across HTTP handlers and the queue
/// consumer.
pub struct TranscriptionService {
    pub(super) store: Arc<dyn EntryStore>,
    pub(super) storage: AudioStorage,
    pub(super) speech: Arc<dyn SpeechBackend>,
    pub(super) generative: Arc<dyn GenerativeBackend>,
    pub(super) audio_params: AudioParams,
    /// `Some` when a broker is configured and was reachable at startup;
    /// `None` means every dispatch runs inline.
    pub(super) queue: Option<Arc<dyn JobQueue>>,
    pub(super) failed_jobs: FailedJobLog,
}

impl TranscriptionService {
    pub fn new(
        store: Arc<dyn EntryStore>,
        storage: AudioStorage,
        speech: Arc<dyn SpeechBackend>,
        generative: Arc<dyn GenerativeBackend>,
        audio_params: AudioParams,
        queue: Option<Arc<dyn JobQueue>>,
    ) -> Self {
        Self {
            store,
            storage,
            speech,
            generative,
            audio_params,
            queue,
            failed_jobs: FailedJobLog::new(),
        }
    }

    pub async fn create_entry(
        &self,
        client_id: String,
        title: Option<String>,
    ) -> Result<LogEntry, TranscribeError> {
        let entry = LogEntry::new(client_id, title);
        self.store
            .insert_entry(entry.clone())
            .await
            .map_err(|e| TranscribeError::Storage(format!("{e:#}")))?;
        Ok(entry)
    }

    pub async fn get_entry(&self, entry_id: Uuid) -> Result<LogEntry, TranscribeError> {
        Ok(self.store.get_entry(entry_id).await?)
    }

    /// Current transcription state of one recording. Always reflects the
    /// last terminal outcome including its error text; a failure is never
    /// hidden behind a generic pending answer.
    pub async fn get_status(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
    ) -> Result<TranscriptionStatusView, TranscribeError> {
        let entry = self.store.get_entry(entry_id).await?;
        let recording = entry
            .recording(recording_id)
            .ok_or(StoreError::RecordingNotFound {
                entry_id,
                recording_id,
            })?;

        Ok(TranscriptionStatusView {
            transcription_status: recording.transcription_status,
            transcript: recording.transcript.clone(),
            transcription_error: recording.transcription_error.clone(),
            transcription_timestamp: recording.transcription_timestamp,
        })
    }

    /// User-facing retry. Always runs inline so the caller gets a direct
    /// success or failure; the compare-and-set in the store rejects a retry
    /// while an attempt is already in flight.
    pub async fn request_transcription(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
    ) -> Result<String, TranscribeError> {
        self.store.begin_transcription(entry_id, recording_id).await?;
        self.run_transcription(entry_id, recording_id).await
    }

    /// Ask the generative backend to restructure a completed transcript.
    /// The raw transcript is never modified.
    pub async fn improve_transcript(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
    ) -> Result<String, TranscribeError> {
        let entry = self.store.get_entry(entry_id).await?;
        let recording = entry
            .recording(recording_id)
            .ok_or(StoreError::RecordingNotFound {
                entry_id,
                recording_id,
            })?;

        let transcript = recording
            .transcript
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TranscribeError::TranscriptRequired)?;

        let improved = self
            .generative
            .generate(IMPROVE_SYSTEM_PROMPT, transcript)
            .await
            .map_err(|e| TranscribeError::Backend(format!("{e:#}")))?;

        self.store
            .update_recording(
                entry_id,
                recording_id,
                RecordingPatch::improved(improved.clone()),
            )
            .await?;

        Ok(improved)
    }

    /// Permanently failed queue jobs, newest last.
    pub async fn failed_jobs(&self) -> Vec<FailedJob> {
        self.failed_jobs.snapshot().await
    }
}
