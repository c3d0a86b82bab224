use super::GenerativeBackend;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Generative text backend speaking the chat-completions wire format.
#[derive(Clone)]
pub struct ChatGenerativeBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl ChatGenerativeBackend {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl GenerativeBackend for ChatGenerativeBackend {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system_prompt.into(),
                },
                Message {
                    role: "user".into(),
                    content: user_prompt.into(),
                },
            ],
            temperature: 0.2,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .context("Failed to reach generative backend")?;
        if !response.status().is_success() {
            let err = response.text().await.unwrap_or_default();
            return Err(anyhow!("Generative backend error: {err}"));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse generative backend response")?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(anyhow!("Generative backend returned an empty response"));
        }
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
