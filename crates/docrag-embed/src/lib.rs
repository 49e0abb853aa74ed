//! Embedders for the docrag pipeline.
//!
//! - [`SentenceEmbedder`]: local BERT sentence model on candle
//! - [`OpenAiEmbedder`]: hosted OpenAI embeddings
//! - [`FakeEmbedder`]: hashed bag-of-words for tests and offline work
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` forces the fake embedder regardless of config.

use anyhow::Result;
use tracing::info;

use docrag_core::config::{EmbeddingProvider, EmbeddingSettings};
use docrag_core::traits::Embedder;

pub mod device;
pub mod fake;
pub mod local;
pub mod openai;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use local::SentenceEmbedder;
pub use openai::OpenAiEmbedder;
pub use pool::masked_mean_l2;

pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let provider = if fake_embeddings_forced() { EmbeddingProvider::Fake } else { settings.provider };
    match provider {
        EmbeddingProvider::Fake => {
            info!("Using FakeEmbedder (dim={})", settings.dimension);
            Ok(Box::new(FakeEmbedder::new(settings.dimension)))
        }
        EmbeddingProvider::OpenAi => {
            info!("Using OpenAI embeddings ({})", settings.model);
            Ok(Box::new(OpenAiEmbedder::from_settings(settings)?))
        }
        EmbeddingProvider::Local => {
            Ok(Box::new(SentenceEmbedder::new(&settings.model, settings.model_dir.as_deref())?))
        }
    }
}
