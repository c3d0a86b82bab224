//! The transcription pipeline: dispatcher, worker, and the status/retry
//! surface consumed by the HTTP layer.
//!
//! One `TranscriptionService` carries the whole pipeline. `dispatch` decides
//! queued vs. inline execution after an upload; `run_transcription` is the
//! worker routine shared by the queue consumer and every inline path;
//! `get_status`, `request_transcription` and `improve_transcript` are the
//! caller-facing operations.

mod dispatcher;
mod service;
mod worker;

pub use dispatcher::DispatchOutcome;
pub use service::{TranscriptionService, TranscriptionStatusView};

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The audio file is missing or unreadable. Permanent: retrying cannot
    /// recover a deleted file.
    #[error("audio unreadable: {0}")]
    AudioUnreadable(String),

    /// Writing uploaded audio to storage failed.
    #[error("audio storage: {0}")]
    Storage(String),

    /// The speech or generative backend rejected the call.
    #[error("backend: {0}")]
    Backend(String),

    #[error("recording has no transcript to improve")]
    TranscriptRequired,
}

impl TranscribeError {
    /// Whether the queue should re-attempt a job that failed with this
    /// error. Only backend failures are worth retrying; missing entries,
    /// missing recordings and unreadable audio stay broken.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
