//! Language-model clients.
//!
//! Both clients are blocking and implement [`LanguageModel`], so the query
//! path does not care which provider answered.

use anyhow::Result;
use tracing::info;

use docrag_core::config::{LlmProvider, LlmSettings};
use docrag_core::traits::LanguageModel;

pub mod error;
pub mod huggingface;
pub mod openai;

pub use error::LlmError;
pub use huggingface::{GenerationParams, HuggingFaceHub};
pub use openai::OpenAiChat;

/// Client for the configured provider. Fails when its API key is unset.
pub fn build_model(settings: &LlmSettings) -> Result<Box<dyn LanguageModel>> {
    info!("Using {:?} model {}", settings.provider, settings.model);
    Ok(match settings.provider {
        LlmProvider::OpenAi => Box::new(OpenAiChat::from_settings(settings)?),
        LlmProvider::HuggingFace => Box::new(HuggingFaceHub::from_settings(settings)?),
    })
}
