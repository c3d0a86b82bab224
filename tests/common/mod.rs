// Shared test fixtures: fake AI backends with call counters and a fully
// wired TranscriptionService over a temp-dir audio store.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use logbook_transcribe::{
    AudioParams, AudioRecording, AudioStorage, EntryStore, GenerativeBackend, JobQueue, LogEntry,
    MemoryEntryStore, ShortTranscript, SpeechBackend, TranscriptionJob, TranscriptionService,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const SHORT_TRANSCRIPT: &str = "patient reviewed, wound healing well";
pub const LONG_TRANSCRIPT: &str = "full theatre session dictation, all steps documented";

/// Speech backend fake that counts which call path was taken and can be
/// scripted to fail.
#[derive(Default)]
pub struct FakeSpeechBackend {
    pub short_calls: AtomicUsize,
    pub long_calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl FakeSpeechBackend {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn total_calls(&self) -> usize {
        self.short_calls.load(Ordering::SeqCst) + self.long_calls.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self) -> Option<String> {
        self.failure.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechBackend for FakeSpeechBackend {
    async fn transcribe_short(
        &self,
        _audio: &[u8],
        _params: &AudioParams,
    ) -> Result<ShortTranscript> {
        self.short_calls.fetch_add(1, Ordering::SeqCst);
        match self.scripted_failure() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(ShortTranscript {
                transcript: SHORT_TRANSCRIPT.to_string(),
                confidence: Some(0.92),
            }),
        }
    }

    async fn transcribe_long(&self, _audio: &[u8], _params: &AudioParams) -> Result<String> {
        self.long_calls.fetch_add(1, Ordering::SeqCst);
        match self.scripted_failure() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(LONG_TRANSCRIPT.to_string()),
        }
    }

    fn name(&self) -> &str {
        "fake-speech"
    }
}

/// Generative backend fake returning a scripted response.
pub struct FakeGenerativeBackend {
    response: Mutex<String>,
    pub calls: AtomicUsize,
}

impl Default for FakeGenerativeBackend {
    fn default() -> Self {
        Self {
            response: Mutex::new("## Findings\npatient reviewed, wound healing well".to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeGenerativeBackend {
    pub fn respond_with(&self, text: &str) {
        *self.response.lock().unwrap() = text.to_string();
    }
}

#[async_trait::async_trait]
impl GenerativeBackend for FakeGenerativeBackend {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "fake-generative"
    }
}

/// Job queue fake that records published jobs and can be scripted to
/// reject publishes, standing in for an unreachable broker.
#[derive(Default)]
pub struct FakeJobQueue {
    pub published: Mutex<Vec<TranscriptionJob>>,
    reject: AtomicBool,
}

impl FakeJobQueue {
    pub fn reject_publishes(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl JobQueue for FakeJobQueue {
    async fn publish_job(&self, job: &TranscriptionJob) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(anyhow!("broker connection lost"));
        }
        self.published.lock().unwrap().push(job.clone());
        Ok(())
    }
}

pub struct TestHarness {
    pub service: Arc<TranscriptionService>,
    pub store: Arc<MemoryEntryStore>,
    pub storage: AudioStorage,
    pub speech: Arc<FakeSpeechBackend>,
    pub generative: Arc<FakeGenerativeBackend>,
    _dir: TempDir,
}

/// Build a service with fake backends, no queue, and a temp audio root.
pub fn harness() -> Result<TestHarness> {
    build_harness(None)
}

/// Same wiring, but dispatching through the given job queue.
pub fn harness_with_queue(queue: Arc<dyn JobQueue>) -> Result<TestHarness> {
    build_harness(Some(queue))
}

fn build_harness(queue: Option<Arc<dyn JobQueue>>) -> Result<TestHarness> {
    let dir = TempDir::new()?;
    let store = Arc::new(MemoryEntryStore::new());
    let storage = AudioStorage::new(dir.path());
    let speech = Arc::new(FakeSpeechBackend::default());
    let generative = Arc::new(FakeGenerativeBackend::default());

    let service = Arc::new(TranscriptionService::new(
        store.clone(),
        storage.clone(),
        speech.clone(),
        generative.clone(),
        AudioParams {
            encoding: "mp3".to_string(),
            sample_rate: 16000,
            language_code: "en-US".to_string(),
        },
        queue,
    ));

    Ok(TestHarness {
        service,
        store,
        storage,
        speech,
        generative,
        _dir: dir,
    })
}

impl TestHarness {
    /// Create an entry and attach one stored recording in `not_requested`,
    /// without dispatching anything.
    pub async fn seed_recording(&self, audio: &[u8]) -> Result<(Uuid, Uuid)> {
        let entry = LogEntry::new("clinic-1".to_string(), Some("ward round".to_string()));
        let entry_id = entry.id;
        self.store.insert_entry(entry).await?;

        let locator = self.storage.save(entry_id, "clip.mp3", audio).await?;
        let recording =
            AudioRecording::new(locator, "clip.mp3".to_string(), audio.len() as u64, None);
        let recording_id = recording.id;
        self.store.append_recording(entry_id, recording).await?;

        Ok((entry_id, recording_id))
    }

    /// Attach a recording whose locator points at nothing on disk.
    pub async fn seed_recording_with_missing_audio(&self) -> Result<(Uuid, Uuid)> {
        let entry = LogEntry::new("clinic-1".to_string(), None);
        let entry_id = entry.id;
        self.store.insert_entry(entry).await?;

        let recording = AudioRecording::new(
            format!("{entry_id}/deleted.mp3"),
            "deleted.mp3".to_string(),
            1024,
            None,
        );
        let recording_id = recording.id;
        self.store.append_recording(entry_id, recording).await?;

        Ok((entry_id, recording_id))
    }
}
