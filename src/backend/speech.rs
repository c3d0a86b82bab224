use super::{AudioParams, ShortTranscript, SpeechBackend};
use anyhow::{anyhow, Context, Result};
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Speech-to-text backend reached over HTTP.
///
/// Short-form transcription is a single multipart POST. Long-form
/// transcription submits the audio to a batch endpoint and polls the
/// returned operation until it finishes.
#[derive(Clone)]
pub struct HttpSpeechBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, Deserialize)]
struct ShortResponse {
    transcript: String,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchSubmitResponse {
    operation_id: String,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    done: bool,
    transcript: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
}

impl HttpSpeechBackend {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(5),
            max_polls: 120,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn audio_form(audio: &[u8], params: &AudioParams) -> Result<multipart::Form> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name("recording")
            .mime_str("application/octet-stream")?;
        Ok(multipart::Form::new()
            .part("file", part)
            .text("encoding", params.encoding.clone())
            .text("sample_rate", params.sample_rate.to_string())
            .text("language_code", params.language_code.clone()))
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T> {
        let mut request = self.client.post(self.url(path)).multipart(form);
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach speech backend")?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str(&text)
                .with_context(|| format!("Unexpected speech backend response: {text}"));
        }

        if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(&text) {
            Err(anyhow!(parsed.error))
        } else if text.is_empty() {
            Err(anyhow!("Speech backend returned status {status}"))
        } else {
            Err(anyhow!(text))
        }
    }

    async fn poll_operation(&self, operation_id: &str) -> Result<String> {
        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let mut request = self.client.get(self.url(&format!("operations/{operation_id}")));
            if !self.api_key.is_empty() {
                request = request.header("x-api-key", &self.api_key);
            }

            let op: OperationResponse = request
                .send()
                .await
                .context("Failed to poll transcription operation")?
                .error_for_status()
                .context("Transcription operation poll rejected")?
                .json()
                .await
                .context("Unexpected operation response")?;

            if !op.done {
                debug!("Operation {} still running", operation_id);
                continue;
            }
            if let Some(error) = op.error {
                return Err(anyhow!(error));
            }
            return op
                .transcript
                .ok_or_else(|| anyhow!("Operation {operation_id} finished without a transcript"));
        }

        Err(anyhow!(
            "Transcription operation {operation_id} did not finish in time"
        ))
    }
}

#[async_trait::async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn transcribe_short(
        &self,
        audio: &[u8],
        params: &AudioParams,
    ) -> Result<ShortTranscript> {
        let form = Self::audio_form(audio, params)?;
        let parsed: ShortResponse = self.post_form("transcribe", form).await?;
        Ok(ShortTranscript {
            transcript: parsed.transcript,
            confidence: parsed.confidence,
        })
    }

    async fn transcribe_long(&self, audio: &[u8], params: &AudioParams) -> Result<String> {
        let form = Self::audio_form(audio, params)?;
        let submitted: BatchSubmitResponse = self.post_form("transcribe/batch", form).await?;
        info!(
            "Submitted long-form transcription operation {}",
            submitted.operation_id
        );
        self.poll_operation(&submitted.operation_id).await
    }

    fn name(&self) -> &str {
        "http-speech"
    }
}
