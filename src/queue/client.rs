use super::messages::TranscriptionJob;
use super::JobQueue;
use anyhow::{Context, Result};
use async_nats::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Subject all transcription jobs travel on.
pub const JOB_SUBJECT: &str = "logbook.transcription.jobs";

/// Total attempts per job before it is marked permanently failed.
pub const MAX_JOB_ATTEMPTS: u32 = 3;

/// How many permanently failed jobs to keep around for inspection.
pub const FAILED_JOB_RETENTION: usize = 200;

const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Delay before re-attempting a failed job: 2s, 4s, 8s for attempts 1..3.
pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Connected handle to the transcription job queue.
pub struct TranscriptionQueue {
    client: Client,
}

impl TranscriptionQueue {
    /// Connect to the NATS broker, retrying `connect_attempts` times before
    /// giving up. Callers treat a final failure as "queue disabled", not as
    /// a startup error.
    pub async fn connect(url: &str, connect_attempts: u32) -> Result<Self> {
        info!("Connecting to job queue at {}", url);

        let attempts = connect_attempts.max(1);
        let mut attempt = 1;
        loop {
            match async_nats::connect(url).await {
                Ok(client) => {
                    info!("Connected to job queue");
                    return Ok(Self { client });
                }
                Err(e) => {
                    warn!(
                        "Job queue connect attempt {}/{} failed: {}",
                        attempt, attempts, e
                    );
                    if attempt >= attempts {
                        return Err(e).context("Failed to connect to job queue");
                    }
                    attempt += 1;
                    tokio::time::sleep(RETRY_BASE_DELAY).await;
                }
            }
        }
    }

    /// Subscribe to the job subject as a queue-group member, so multiple
    /// worker processes split the work instead of duplicating it.
    pub async fn subscribe(&self) -> Result<async_nats::Subscriber> {
        let subscriber = self
            .client
            .queue_subscribe(JOB_SUBJECT, "transcription-workers".to_string())
            .await
            .context("Failed to subscribe to transcription jobs")?;

        info!("Subscribed to {}", JOB_SUBJECT);
        Ok(subscriber)
    }

    /// Flush outstanding publishes before shutdown so in-flight jobs are not
    /// abandoned silently. The connection itself closes on drop.
    pub async fn close(&self) -> Result<()> {
        info!("Draining job queue connection");
        self.client
            .flush()
            .await
            .context("Failed to drain job queue connection")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobQueue for TranscriptionQueue {
    /// Publish a job and flush, so a broker failure surfaces here rather
    /// than being buffered away. The dispatcher falls back to inline
    /// execution when this errors.
    async fn publish_job(&self, job: &TranscriptionJob) -> Result<()> {
        let payload = serde_json::to_vec(job)?;

        self.client
            .publish(JOB_SUBJECT, payload.into())
            .await
            .context("Failed to publish transcription job")?;
        self.client
            .flush()
            .await
            .context("Failed to flush transcription job")?;

        info!(
            "Enqueued transcription job {} (entry={}, recording={}, attempt={})",
            job.job_id, job.entry_id, job.recording_id, job.attempt
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_from_two_seconds() {
        assert_eq!(retry_delay(1), Duration::from_secs(2));
        assert_eq!(retry_delay(2), Duration::from_secs(4));
        assert_eq!(retry_delay(3), Duration::from_secs(8));
    }
}
