//! Configuration loader, typed pipeline settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys split on `__`, e.g. `APP_QUERY__K=4`). The selected
//! `pipeline.variant` supplies the defaults that explicit keys override.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => debug!(env = other, "no config overlay for environment"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings: variant preset, overridden by whatever the sources set.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let variant = if self.figment.contains("pipeline.variant") {
            self.get::<Variant>("pipeline.variant")?
        } else {
            Variant::default()
        };
        let settings: Settings = Figment::from(Serialized::defaults(Settings::preset(variant)))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Reads `.env` from the working directory (or a parent) into the process
/// environment. A missing file is fine; a malformed one is logged.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("failed to read .env: {}", e),
    }
}

/// Which pair of index/query pipelines to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "openai")]
    OpenAi,
    #[default]
    #[serde(rename = "open-source")]
    OpenSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Local,
    Fake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    HuggingFace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub data: DataSettings,
    pub splitter: SplitterSettings,
    pub embedding: EmbeddingSettings,
    pub query: QuerySettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub variant: Variant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub source_dir: String,
    pub glob: String,
    pub index_dir: String,
}

impl DataSettings {
    pub fn source_dir(&self) -> PathBuf {
        expand_path(&self.source_dir)
    }

    pub fn index_dir(&self) -> PathBuf {
        expand_path(&self.index_dir)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitterSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    /// Local model directory; falls back to `APP_MODEL_DIR`/`MODEL_DIR`.
    pub model_dir: Option<String>,
    pub dimension: usize,
    pub batch_size: usize,
    pub endpoint: Option<String>,
}

/// Retrieval knobs. `preview_k == 0` disables the preview search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuerySettings {
    pub k: usize,
    pub preview_k: usize,
    pub context_k: usize,
    pub relevance_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub max_length: u32,
    pub top_p: f32,
    pub do_sample: bool,
}

impl Settings {
    pub fn preset(variant: Variant) -> Self {
        let pipeline = PipelineSettings { variant };
        let data = DataSettings {
            source_dir: "data/books".to_string(),
            glob: "*.md".to_string(),
            index_dir: "index".to_string(),
        };
        let splitter = SplitterSettings { chunk_size: 300, chunk_overlap: 100 };
        match variant {
            Variant::OpenAi => Self {
                pipeline,
                data,
                splitter,
                embedding: EmbeddingSettings {
                    provider: EmbeddingProvider::OpenAi,
                    model: "text-embedding-ada-002".to_string(),
                    model_dir: None,
                    dimension: 1536,
                    batch_size: 256,
                    endpoint: None,
                },
                query: QuerySettings { k: 3, preview_k: 0, context_k: 3, relevance_threshold: 0.7 },
                llm: LlmSettings {
                    provider: LlmProvider::OpenAi,
                    model: "gpt-3.5-turbo".to_string(),
                    endpoint: None,
                    temperature: 0.0,
                    max_length: 512,
                    top_p: 1.0,
                    do_sample: false,
                },
            },
            Variant::OpenSource => Self {
                pipeline,
                data,
                splitter,
                embedding: EmbeddingSettings {
                    provider: EmbeddingProvider::Local,
                    model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                    model_dir: None,
                    dimension: 384,
                    batch_size: 64,
                    endpoint: None,
                },
                query: QuerySettings { k: 5, preview_k: 8, context_k: 3, relevance_threshold: 0.3 },
                llm: LlmSettings {
                    provider: LlmProvider::HuggingFace,
                    model: "google/flan-t5-base".to_string(),
                    endpoint: None,
                    temperature: 0.7,
                    max_length: 512,
                    top_p: 0.95,
                    do_sample: true,
                },
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.splitter;
        if s.chunk_size == 0 {
            return Err(Error::InvalidConfig("splitter.chunk_size must be positive".into()));
        }
        if s.chunk_overlap >= s.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "splitter.chunk_overlap ({}) must be smaller than splitter.chunk_size ({})",
                s.chunk_overlap, s.chunk_size
            )));
        }
        let q = &self.query;
        if q.k == 0 {
            return Err(Error::InvalidConfig("query.k must be positive".into()));
        }
        if q.context_k == 0 || q.context_k > q.k {
            return Err(Error::InvalidConfig(format!(
                "query.context_k ({}) must be between 1 and query.k ({})",
                q.context_k, q.k
            )));
        }
        if !(0.0..=1.0).contains(&q.relevance_threshold) {
            return Err(Error::InvalidConfig(format!(
                "query.relevance_threshold ({}) must lie in [0, 1]",
                q.relevance_threshold
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
