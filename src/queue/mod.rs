//! Durable transcription job queue backed by NATS.
//!
//! The queue is optional: when no broker is configured, or the broker is
//! unreachable at startup, the process runs in queue-disabled mode and every
//! dispatch takes the synchronous path. The handle for this is an
//! `Option<Arc<dyn JobQueue>>`; dispatch logic branches on the value, not
//! on shared mutable state.

mod client;
mod messages;

pub use client::{
    retry_delay, TranscriptionQueue, FAILED_JOB_RETENTION, JOB_SUBJECT, MAX_JOB_ATTEMPTS,
};
pub use messages::{FailedJob, TranscriptionJob};

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Enqueue side of the transcription job queue.
///
/// The dispatcher only ever publishes; consuming stays on the concrete
/// broker client. Tests substitute a queue that rejects publishes to
/// exercise the inline fallback.
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    async fn publish_job(&self, job: &TranscriptionJob) -> Result<()>;
}

/// Bounded in-memory record of permanently failed jobs, kept for
/// operational diagnosis after the queue gives up on them.
#[derive(Clone, Default)]
pub struct FailedJobLog {
    entries: Arc<Mutex<VecDeque<FailedJob>>>,
}

impl FailedJobLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, failed: FailedJob) {
        let mut entries = self.entries.lock().await;
        if entries.len() == FAILED_JOB_RETENTION {
            entries.pop_front();
        }
        entries.push_back(failed);
    }

    pub async fn snapshot(&self) -> Vec<FailedJob> {
        self.entries.lock().await.iter().cloned().collect()
    }
}
