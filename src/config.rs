use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
    pub llm: LlmConfig,
    /// Absent section means queue-disabled mode: every dispatch runs
    /// inline.
    pub queue: Option<QueueConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub audio_path: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_language")]
    pub language_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct QueueConfig {
    pub url: String,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
}

fn default_encoding() -> String {
    "mp3".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_connect_attempts() -> u32 {
    3
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
