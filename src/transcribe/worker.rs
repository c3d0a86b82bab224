use super::service::TranscriptionService;
use super::TranscribeError;
use crate::backend::{select_call, BackendCall};
use crate::model::RecordingPatch;
use crate::queue::{retry_delay, FailedJob, JobQueue, TranscriptionJob, MAX_JOB_ATTEMPTS};
use crate::store::StoreError;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

impl TranscriptionService {
    /// Transcribe one recording and persist the outcome.
    ///
    /// This is the single worker routine; the queue consumer and every
    /// inline path call exactly this. The entry is re-fetched fresh rather
    /// than trusted from enqueue time, since recordings may have been
    /// removed in between.
    pub async fn run_transcription(
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
            })?
            .clone();

        // Queue retries re-enter here after a failed terminal state;
        // re-assert processing so pollers see the new attempt.
        self.store
            .update_recording(entry_id, recording_id, RecordingPatch::processing())
            .await?;

        let audio = match self.storage.read(&recording.storage_locator).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let message = format!("{e:#}");
                self.store
                    .update_recording(entry_id, recording_id, RecordingPatch::failed(message.clone()))
                    .await?;
                return Err(TranscribeError::AudioUnreadable(message));
            }
        };

        let call = select_call(audio.len() as u64);
        info!(
            "Transcribing recording {} ({} bytes, {:?} via {})",
            recording_id,
            audio.len(),
            call,
            self.speech.name()
        );

        let result = match call {
            BackendCall::ShortForm => self
                .speech
                .transcribe_short(&audio, &self.audio_params)
                .await
                .map(|t| t.transcript),
            BackendCall::LongForm => self.speech.transcribe_long(&audio, &self.audio_params).await,
        };

        match result {
            Ok(transcript) => {
                self.store
                    .update_recording(
                        entry_id,
                        recording_id,
                        RecordingPatch::completed(transcript.clone()),
                    )
                    .await?;
                info!(
                    "Transcription completed for recording {} ({} chars)",
                    recording_id,
                    transcript.len()
                );
                Ok(transcript)
            }
            Err(e) => {
                let message = format!("{e:#}");
                self.store
                    .update_recording(entry_id, recording_id, RecordingPatch::failed(message.clone()))
                    .await?;
                Err(TranscribeError::Backend(message))
            }
        }
    }

    /// Consume transcription jobs from the queue until the subscription
    /// ends. Each job runs in its own task, so a slow long-form call does
    /// not stall the rest of the queue.
    pub async fn run_queue_consumer(self: Arc<Self>, mut subscriber: async_nats::Subscriber) {
        info!("Transcription job consumer started");

        while let Some(message) = subscriber.next().await {
            let job: TranscriptionJob = match serde_json::from_slice(&message.payload) {
                Ok(job) => job,
                Err(e) => {
                    warn!("Discarding malformed transcription job: {}", e);
                    continue;
                }
            };

            let service = Arc::clone(&self);
            tokio::spawn(async move {
                service.handle_job(job).await;
            });
        }

        info!("Transcription job consumer stopped");
    }

    /// Run one queued job, re-enqueueing retryable failures with backoff
    /// until the attempt ceiling, then recording the job as permanently
    /// failed.
    pub async fn handle_job(&self, job: TranscriptionJob) {
        info!(
            "Consuming transcription job {} (entry={}, recording={}, attempt={}/{})",
            job.job_id, job.entry_id, job.recording_id, job.attempt, MAX_JOB_ATTEMPTS
        );

        match self.run_transcription(job.entry_id, job.recording_id).await {
            Ok(_) => {}
            Err(e) if e.is_retryable() && job.attempt < MAX_JOB_ATTEMPTS => {
                let delay = retry_delay(job.attempt);
                warn!(
                    "Job {} attempt {}/{} failed: {}; retrying in {:?}",
                    job.job_id, job.attempt, MAX_JOB_ATTEMPTS, e, delay
                );
                tokio::time::sleep(delay).await;

                let next = job.next_attempt();
                match &self.queue {
                    Some(queue) => {
                        if let Err(publish_err) = queue.publish_job(&next).await {
                            error!(
                                "Failed to re-enqueue job {}: {:#}",
                                next.job_id, publish_err
                            );
                            self.failed_jobs
                                .record(FailedJob::new(next, e.to_string()))
                                .await;
                        }
                    }
                    None => {
                        self.failed_jobs
                            .record(FailedJob::new(next, e.to_string()))
                            .await;
                    }
                }
            }
            Err(e) => {
                error!(
                    "Job {} permanently failed after attempt {}/{}: {}",
                    job.job_id, job.attempt, MAX_JOB_ATTEMPTS, e
                );
                self.failed_jobs.record(FailedJob::new(job, e.to_string())).await;
            }
        }
    }
}
