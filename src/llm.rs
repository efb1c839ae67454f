//! Hosted chat-model clients.
//!
//! Two providers are supported, selected explicitly by [`Provider::for_model`]:
//! - **OpenAI** — `POST /v1/chat/completions`, temperature 0.7, key from
//!   `OPENAI_API_KEY`.
//! - **Gemini** — `POST …:generateContent` on the Generative Language API,
//!   temperature 0, key from `GEMINI_API_KEY`.
//!
//! The completion path performs exactly one HTTP call with no retry: a failed
//! answer must surface as a failed answer, not a silently repeated one.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::chunk::CHARS_PER_TOKEN;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Who authored a message in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a structured chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The chat-model backend. Model names containing "gpt" select OpenAI;
/// everything else goes to Gemini. Dispatch is a single explicit enum
/// rather than string checks scattered through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn for_model(model: &str) -> Self {
        if model.contains("gpt") {
            Provider::OpenAi
        } else {
            Provider::Gemini
        }
    }

    /// Sampling temperature each provider is run with.
    pub fn temperature(self) -> f32 {
        match self {
            Provider::OpenAi => 0.7,
            Provider::Gemini => 0.0,
        }
    }

    fn api_key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// A configured chat-model client.
pub struct ChatModel {
    provider: Provider,
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::Client,
}

impl ChatModel {
    /// Select the provider for `model` and verify its API key is present.
    pub fn new(model: &str) -> Result<Self> {
        let provider = Provider::for_model(model);
        let api_key = std::env::var(provider.api_key_var())
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", provider.api_key_var()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            provider,
            model: model.to_string(),
            temperature: provider.temperature(),
            api_key,
            client,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Rough token count for memory budgeting. Both providers tokenize at
    /// roughly four characters per token for western text, the same ratio
    /// the chunker uses.
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.len().div_ceil(CHARS_PER_TOKEN)
    }

    /// Send a structured prompt and return the model's text reply.
    /// Exactly one HTTP call; any failure propagates to the caller.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        match self.provider {
            Provider::OpenAi => self.complete_openai(messages).await,
            Provider::Gemini => self.complete_gemini(messages).await,
        }
    }

    async fn complete_openai(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = build_openai_body(&self.model, self.temperature, messages);

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("OpenAI chat request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_openai_reply(&json)
    }

    async fn complete_gemini(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = build_gemini_body(self.temperature, messages);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Gemini chat request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_gemini_reply(&json)
    }
}

fn build_openai_body(
    model: &str,
    temperature: f32,
    messages: &[ChatMessage],
) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": m.content })
        })
        .collect();

    serde_json::json!({
        "model": model,
        "temperature": temperature,
        "messages": messages,
    })
}

/// Gemini has no system role in `contents`; system messages are folded into
/// `systemInstruction` and assistant turns are called "model".
fn build_gemini_body(temperature: f32, messages: &[ChatMessage]) -> serde_json::Value {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let contents: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "model",
                _ => "user",
            };
            serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut body = serde_json::json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    });

    if !system_text.is_empty() {
        body["systemInstruction"] =
            serde_json::json!({ "parts": [{ "text": system_text.join("\n\n") }] });
    }

    body
}

fn parse_openai_reply(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

fn parse_gemini_reply(json: &serde_json::Value) -> Result<String> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidates[0].content.parts[0].text"))
}
