use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of transcription work carried over the queue.
///
/// The job addresses its recording by durable id, so recordings added or
/// removed on the same entry between enqueue and consume cannot redirect it
/// to the wrong recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub job_id: Uuid,
    pub entry_id: Uuid,
    pub recording_id: Uuid,
    pub storage_locator: String,
    /// 1-based attempt counter; the consumer re-publishes with this bumped
    /// until the attempt ceiling is hit.
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl TranscriptionJob {
    pub fn new(entry_id: Uuid, recording_id: Uuid, storage_locator: String) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            entry_id,
            recording_id,
            storage_locator,
            attempt: 1,
            enqueued_at: Utc::now(),
        }
    }

    /// The same job, one attempt later.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            enqueued_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// A job the queue gave up on, retained for diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJob {
    pub job: TranscriptionJob,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl FailedJob {
    pub fn new(job: TranscriptionJob, error: impl Into<String>) -> Self {
        Self {
            job,
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}
