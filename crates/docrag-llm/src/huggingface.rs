//! Text generation through the Hugging Face hosted inference API.
//!
//! The model's text comes back as `[{"generated_text": "..."}]`; failures as
//! `{"error": "..."}`, sometimes with a 200 status while the model loads.

use serde::{Deserialize, Serialize};
use tracing::debug;

use docrag_core::config::LlmSettings;
use docrag_core::traits::LanguageModel;

use crate::error::{api_key, LlmError, Result};

pub const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";
pub const HF_API_TOKEN_ENV: &str = "HUGGINGFACE_API_TOKEN";

/// Sampling parameters forwarded verbatim to the inference API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_length: u32,
    pub top_p: f32,
    pub do_sample: bool,
}

impl From<&LlmSettings> for GenerationParams {
    fn from(s: &LlmSettings) -> Self {
        Self { temperature: s.temperature, max_length: s.max_length, top_p: s.top_p, do_sample: s.do_sample }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParams,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generated(Vec<Generated>),
    Single(Generated),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

pub struct HuggingFaceHub {
    client: reqwest::blocking::Client,
    url: String,
    token: String,
    model: String,
    params: GenerationParams,
}

impl HuggingFaceHub {
    pub fn new(token: String, model: &str, endpoint: Option<String>, params: GenerationParams) -> Self {
        let base = endpoint.unwrap_or_else(|| HF_INFERENCE_BASE.to_string());
        Self {
            client: reqwest::blocking::Client::new(),
            url: format!("{}/{}", base.trim_end_matches('/'), model),
            token,
            model: model.to_string(),
            params,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let token = api_key(HF_API_TOKEN_ENV)?;
        Ok(Self::new(token, &settings.model, settings.endpoint.clone(), settings.into()))
    }

    pub fn generate(&self, prompt: &str) -> Result<String> {
        debug!("POST {} ({:?})", self.url, self.params);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&InferenceRequest { inputs: prompt, parameters: self.params })
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        parse_inference_response(status, &body)
    }
}

impl LanguageModel for HuggingFaceHub {
    fn model_name(&self) -> &str { &self.model }

    fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.generate(prompt)?)
    }
}

fn parse_inference_response(status: u16, body: &str) -> Result<String> {
    let parsed = match serde_json::from_str::<InferenceResponse>(body) {
        Ok(p) => p,
        Err(_) if !(200..300).contains(&status) => {
            return Err(LlmError::Api { status, message: body.to_string() })
        }
        Err(e) => return Err(e.into()),
    };
    match parsed {
        InferenceResponse::Failed { error } => Err(LlmError::Api { status, message: error }),
        InferenceResponse::Single(g) => Ok(g.generated_text),
        InferenceResponse::Generated(list) => {
            list.into_iter().next().map(|g| g.generated_text).ok_or(LlmError::EmptyResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams { temperature: 0.7, max_length: 512, top_p: 0.95, do_sample: true }
    }

    #[test]
    fn url_points_at_model_repo() {
        let hub = HuggingFaceHub::new("t".into(), "google/flan-t5-base", None, params());
        assert_eq!(hub.url, "https://api-inference.huggingface.co/models/google/flan-t5-base");
        let hub = HuggingFaceHub::new("t".into(), "m", Some("http://localhost:8080/".into()), params());
        assert_eq!(hub.url, "http://localhost:8080/m");
    }

    #[test]
    fn request_carries_generation_parameters() {
        let body = serde_json::to_value(InferenceRequest { inputs: "hi", parameters: params() }).unwrap();
        assert_eq!(body["inputs"], "hi");
        assert_eq!(body["parameters"]["max_length"], 512);
        assert_eq!(body["parameters"]["do_sample"], true);
        assert!((body["parameters"]["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn generated_text_is_returned() {
        let out = parse_inference_response(200, r#"[{"generated_text":"Paris"}]"#).unwrap();
        assert_eq!(out, "Paris");
        let out = parse_inference_response(200, r#"{"generated_text":"Lyon"}"#).unwrap();
        assert_eq!(out, "Lyon");
    }

    #[test]
    fn error_payload_becomes_api_error() {
        let err = parse_inference_response(503, r#"{"error":"Model is currently loading","estimated_time":20.0}"#)
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, ref message } if message == "Model is currently loading"));
        let err = parse_inference_response(500, "Internal Server Error").unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }

    #[test]
    fn empty_list_is_empty_response() {
        assert!(matches!(parse_inference_response(200, "[]"), Err(LlmError::EmptyResponse)));
    }
}
