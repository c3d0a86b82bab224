use super::service::TranscriptionService;
use super::TranscribeError;
use crate::model::AudioRecording;
use crate::queue::{JobQueue, TranscriptionJob};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Which execution path a dispatch took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A job was accepted by the queue; the outcome arrives asynchronously.
    Queued,
    /// Transcription ran inline and reached a terminal state before this
    /// dispatch returned.
    Inline,
}

impl TranscriptionService {
    /// Store an uploaded audio buffer, attach it to the entry as a fresh
    /// recording, and kick off transcription.
    pub async fn ingest_recording(
        &self,
        entry_id: Uuid,
        filename: &str,
        bytes: &[u8],
        duration_seconds: Option<f64>,
    ) -> Result<(Uuid, DispatchOutcome), TranscribeError> {
        // Verify the entry exists before writing bytes, so a bad id does
        // not leave an orphaned audio file behind.
        self.store.get_entry(entry_id).await?;

        let locator = self
            .storage
            .save(entry_id, filename, bytes)
            .await
            .map_err(|e| TranscribeError::Storage(format!("{e:#}")))?;

        let recording = AudioRecording::new(
            locator.clone(),
            filename.to_string(),
            bytes.len() as u64,
            duration_seconds,
        );
        let recording_id = recording.id;
        self.store.append_recording(entry_id, recording).await?;

        let outcome = self.dispatch(entry_id, recording_id, &locator).await?;
        Ok((recording_id, outcome))
    }

    /// Decide the execution strategy for a freshly stored recording.
    ///
    /// The recording is moved into `Processing` first, whichever path is
    /// taken, so a concurrent status read never sees a stale
    /// `not_requested` for work that is in flight. With a queue, the job is
    /// published and this returns immediately; without one, or when the
    /// enqueue fails, the worker runs inline before returning.
    pub async fn dispatch(
        &self,
        entry_id: Uuid,
        recording_id: Uuid,
        storage_locator: &str,
    ) -> Result<DispatchOutcome, TranscribeError> {
        self.store.begin_transcription(entry_id, recording_id).await?;

        if let Some(queue) = &self.queue {
            let job = TranscriptionJob::new(entry_id, recording_id, storage_locator.to_string());
            match queue.publish_job(&job).await {
                Ok(()) => return Ok(DispatchOutcome::Queued),
                Err(e) => {
                    warn!(
                        "Enqueue failed for recording {}, falling back to inline transcription: {:#}",
                        recording_id, e
                    );
                }
            }
        }

        // Inline path: the worker has already persisted any failure to the
        // recording, and there is no queue to retry it, so the error stops
        // here instead of reaching the upload caller.
        if let Err(e) = self.run_transcription(entry_id, recording_id).await {
            error!(
                "Inline transcription failed for recording {}: {}",
                recording_id, e
            );
        } else {
            info!("Inline transcription completed for recording {}", recording_id);
        }

        Ok(DispatchOutcome::Inline)
    }
}
