// Tests for the job wire type and the bounded failed-job log. Broker
// round-trips need a running NATS server and live in operational testing,
// not here.

use anyhow::Result;
use logbook_transcribe::{FailedJob, FailedJobLog, TranscriptionJob};
use logbook_transcribe::queue::FAILED_JOB_RETENTION;
use uuid::Uuid;

#[test]
fn next_attempt_bumps_only_the_counter() {
    let job = TranscriptionJob::new(Uuid::new_v4(), Uuid::new_v4(), "e/a.mp3".to_string());
    let retry = job.next_attempt();

    assert_eq!(retry.attempt, 2);
    assert_eq!(retry.job_id, job.job_id);
    assert_eq!(retry.entry_id, job.entry_id);
    assert_eq!(retry.recording_id, job.recording_id);
    assert_eq!(retry.storage_locator, job.storage_locator);
    assert!(retry.enqueued_at >= job.enqueued_at);
}

#[tokio::test]
async fn failed_job_log_drops_oldest_past_retention() -> Result<()> {
    let log = FailedJobLog::new();

    let mut job_ids = Vec::new();
    for _ in 0..(FAILED_JOB_RETENTION + 5) {
        let job = TranscriptionJob::new(Uuid::new_v4(), Uuid::new_v4(), "e/a.mp3".to_string());
        job_ids.push(job.job_id);
        log.record(FailedJob::new(job, "backend unreachable")).await;
    }

    let snapshot = log.snapshot().await;
    assert_eq!(snapshot.len(), FAILED_JOB_RETENTION);
    // The oldest five were evicted; the newest survives.
    assert_eq!(snapshot[0].job.job_id, job_ids[5]);
    assert_eq!(
        snapshot.last().unwrap().job.job_id,
        *job_ids.last().unwrap()
    );
    Ok(())
}
