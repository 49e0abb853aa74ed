//! Chat completions against an OpenAI-compatible `/v1/chat/completions` endpoint.

use serde::{Deserialize, Serialize};
use tracing::debug;

use docrag_core::config::LlmSettings;
use docrag_core::traits::LanguageModel;

use crate::error::{api_key, LlmError, Result};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: &str, endpoint: Option<String>, temperature: f32) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            api_key,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let key = api_key(OPENAI_API_KEY_ENV)?;
        Ok(Self::new(key, &settings.model, settings.endpoint.clone(), settings.temperature))
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        }
    }

    pub fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        debug!("POST {} (model {})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        parse_chat_response(&body)
    }
}

impl LanguageModel for OpenAiChat {
    fn model_name(&self) -> &str { &self.model }

    fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.complete(prompt)?)
    }
}

fn api_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    LlmError::Api { status, message }
}

fn parse_chat_response(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LlmError::EmptyResponse)
}
