//! External AI backends: speech-to-text and generative text.
//!
//! Both are consumed through object-safe traits so the pipeline can run
//! against fakes in tests and against the HTTP clients in production.

mod llm;
mod speech;

pub use llm::ChatGenerativeBackend;
pub use speech::HttpSpeechBackend;

use anyhow::Result;

/// Which speech-to-text invocation to use for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// Single request/response transcription. The backend caps the audio
    /// duration it accepts on this path.
    ShortForm,
    /// Long-running/batch transcription with no duration ceiling.
    LongForm,
}

/// Payloads above this size take the long-form path. 1 MiB is an empirical
/// proxy for roughly a minute of compressed audio, which is where the
/// short-form call's duration ceiling starts to bite.
pub const LONG_FORM_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// Pick the backend call for a payload size. Pure so routing is testable
/// without any network.
pub fn select_call(size_bytes: u64) -> BackendCall {
    if size_bytes > LONG_FORM_THRESHOLD_BYTES {
        BackendCall::LongForm
    } else {
        BackendCall::ShortForm
    }
}

/// Parameters describing the audio being transcribed, forwarded to the
/// backend as-is.
#[derive(Debug, Clone)]
pub struct AudioParams {
    pub encoding: String,
    pub sample_rate: u32,
    pub language_code: String,
}

/// Result of a short-form transcription call.
#[derive(Debug, Clone)]
pub struct ShortTranscript {
    pub transcript: String,
    pub confidence: Option<f32>,
}

/// Speech-to-text backend.
///
/// Errors are opaque failures with a human-readable message; the worker
/// persists that message into the recording's `transcription_error`.
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synchronous transcription for short clips.
    async fn transcribe_short(&self, audio: &[u8], params: &AudioParams)
        -> Result<ShortTranscript>;

    /// Long-running transcription for clips past the short-form duration
    /// ceiling.
    async fn transcribe_long(&self, audio: &[u8], params: &AudioParams) -> Result<String>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Generative text backend used by the transcript post-processor.
#[async_trait::async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_at_or_under_threshold_go_short_form() {
        assert_eq!(select_call(0), BackendCall::ShortForm);
        assert_eq!(select_call(512 * 1024), BackendCall::ShortForm);
        assert_eq!(select_call(LONG_FORM_THRESHOLD_BYTES), BackendCall::ShortForm);
    }

    #[test]
    fn payloads_over_threshold_go_long_form() {
        assert_eq!(
            select_call(LONG_FORM_THRESHOLD_BYTES + 1),
            BackendCall::LongForm
        );
        assert_eq!(select_call(10 * 1024 * 1024), BackendCall::LongForm);
    }
}
