pub mod backend;
pub mod config;
pub mod http;
pub mod model;
pub mod queue;
pub mod storage;
pub mod store;
pub mod transcribe;

pub use backend::{
    select_call, AudioParams, BackendCall, ChatGenerativeBackend, GenerativeBackend,
    HttpSpeechBackend, ShortTranscript, SpeechBackend, LONG_FORM_THRESHOLD_BYTES,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use model::{AudioRecording, LogEntry, RecordingPatch, TranscriptionStatus};
pub use queue::{FailedJob, FailedJobLog, JobQueue, TranscriptionJob, TranscriptionQueue};
pub use storage::AudioStorage;
pub use store::{EntryStore, MemoryEntryStore, StoreError};
pub use transcribe::{
    DispatchOutcome, TranscribeError, TranscriptionService, TranscriptionStatusView,
};
