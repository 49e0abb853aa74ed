//! Hosted embeddings through the OpenAI `/v1/embeddings` endpoint.
//!
//! Works with any OpenAI-compatible endpoint; inputs are sent in batches of
//! `batch_size` and the response rows are reordered by their `index`.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docrag_core::config::EmbeddingSettings;
use docrag_core::traits::Embedder;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
    batch_size: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: &str, endpoint: Option<String>, dim: usize, batch_size: usize) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            api_key,
            model: model.to_string(),
            dim,
            batch_size: batch_size.max(1),
            id: format!("openai:{}:d{}", model, dim),
        }
    }

    /// Reads the API key from `OPENAI_API_KEY`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV)
            .map_err(|_| anyhow!("{} is not set; add it to .env or the environment", OPENAI_API_KEY_ENV))?;
        Ok(Self::new(
            api_key,
            &settings.model,
            settings.endpoint.clone(),
            settings.dimension,
            settings.batch_size,
        ))
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));
        debug!("POST {} ({} inputs)", url, texts.len());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .with_context(|| format!("embedding request to {} failed", url))?;

        let status = response.status();
        let body = response.text().context("failed to read embedding response")?;
        if !status.is_success() {
            bail!("OpenAI embeddings API error {}: {}", status, body);
        }
        let vectors = parse_embedding_response(&body, texts.len())?;
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            bail!(
                "model {} returned {}-dim vectors but embedding.dimension is {}",
                self.model,
                v.len(),
                self.dim
            );
        }
        Ok(vectors)
    }
}

impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { 8191 }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.request(batch)?);
        }
        Ok(out)
    }
}

fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(body).context("malformed embedding response")?;
    if parsed.data.len() != expected {
        bail!("expected {} embeddings, got {}", expected, parsed.data.len());
    }
    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_rows_are_reordered_by_index() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"text-embedding-ada-002"}"#;
        let vectors = parse_embedding_response(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn response_with_missing_rows_is_rejected() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]}]}"#;
        assert!(parse_embedding_response(body, 2).is_err());
    }

    #[test]
    fn embedder_id_names_model_and_dimension() {
        let e = OpenAiEmbedder::new("key".into(), "text-embedding-ada-002", None, 1536, 0);
        assert_eq!(e.embedder_id(), "openai:text-embedding-ada-002:d1536");
        assert_eq!(e.endpoint, OPENAI_API_BASE);
        assert_eq!(e.batch_size, 1);
    }

    #[test]
    fn request_body_matches_api_shape() {
        let input = vec!["hello".to_string()];
        let body = serde_json::to_value(EmbeddingRequest { model: "m", input: &input }).unwrap();
        assert_eq!(body, serde_json::json!({"model": "m", "input": ["hello"]}));
    }
}
