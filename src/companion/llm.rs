//! Chat model client.
//!
//! [`ChatModel`] is the seam the responder talks to; [`GeminiChat`] implements
//! it against the Gemini `generateContent` REST endpoint. Each call is a fresh
//! single-turn conversation.

use std::time::Duration;

use serde_json::{json, Value};

/// Why a model call produced no reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("request to model endpoint failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response had no text")]
    EmptyReply,
}

/// Maximum body bytes kept on an HTTP error.
const MAX_ERROR_BODY: usize = 300;

/// A chat-style LLM endpoint: prompt in, text out.
#[allow(async_fn_in_trait)]
pub trait ChatModel {
    async fn reply(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct GeminiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiChat {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &crate::config::CompanionConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

impl ChatModel for GeminiChat {
    async fn reply(&self, prompt: &str) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending prompt");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|_| LlmError::EmptyReply)?;
        extract_reply_text(&value).ok_or(LlmError::EmptyReply)
    }
}

/// Concatenate the text parts of the first candidate.
pub fn extract_reply_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
