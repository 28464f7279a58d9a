use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed condensation persona: financial-domain expert, one-sentence
/// plain-language summary emphasizing the core fact and its impact.
pub const CONDENSE_SYSTEM_PROMPT: &str = "你是一个金融领域的专家，善于总结个股公告内容。请你把公告内容总结成一句话，用词简明，适合非金融专业的读者理解，突出公告的核心信息和影响";

pub const PROVIDER_LABEL: &str = "百炼大模型";

const LLM_TIMEOUT: Duration = Duration::from_secs(90);

/// Language-model call interface: reduce input text to a short digest under
/// the fixed persona prompt. Failure is an error, not a special return value.
#[async_trait]
pub trait Condenser: Send + Sync {
    async fn condense(&self, text: &str) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: String,
}

/// DashScope condensation client, speaking the OpenAI-compatible
/// chat-completions wire shape.
pub struct QwenCondenser {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl QwenCondenser {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(LLM_TIMEOUT).build()?;
        Ok(QwenCondenser {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Condenser for QwenCondenser {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn condense(&self, text: &str) -> anyhow::Result<String> {
        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: CONDENSE_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_tokens: 512,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            tracing::error!(%status, %body, "LLM API error");
            anyhow::bail!("LLM API returned status {}: {}", status, body);
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("LLM API returned no choices"))?;

        Ok(content)
    }
}
