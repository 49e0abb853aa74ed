use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use docrag_core::config::expand_path;
use docrag_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

/// sentence-transformers truncate MiniLM inputs at 256 word pieces.
const DEFAULT_MAX_LEN: usize = 256;

/// A BERT-family sentence model (e.g. all-MiniLM-L6-v2) run locally with candle.
///
/// The model directory must hold `tokenizer.json`, `config.json` and either
/// `model.safetensors` or `pytorch_model.bin`.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
}

impl SentenceEmbedder {
    pub fn new(model_name: &str, model_dir: Option<&str>) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(model_name, model_dir)?;
        info!("Loading {} from {}", model_name, model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let vb = load_weights(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        let max_len = config.max_position_embeddings.min(DEFAULT_MAX_LEN);
        info!("Model ready (dim={}, max_len={})", dim, max_len);

        Ok(Self { model, tokenizer, device, id: format!("local:{}:d{}", model_name, dim), dim, max_len })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.squeeze(0)?.to_device(&Device::Cpu)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            bail!("model produced {} dims, expected {}", emb.len(), self.dim);
        }
        if start.elapsed().as_millis() > 250 {
            warn!("Slow embedding ({} ms)", start.elapsed().as_millis());
        }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("embedding {} texts locally", texts.len());
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!("Loading weights from {}", safetensors.display());
        // SAFETY: the file is mapped read-only and nothing rewrites it while the model lives.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    debug!("Loading weights from {}", weights_path.display());
    let weights = candle_core::pickle::read_all(&weights_path)
        .with_context(|| format!("Failed to read weights from {}", weights_path.display()))?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

fn resolve_model_dir(model_name: &str, configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        bail!("Configured model directory {} does not exist", p.display());
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { debug!("Using {}: {}", var, p.display()); return Ok(p); }
        }
    }
    let short_name = model_name.rsplit('/').next().unwrap_or(model_name);
    let default_dir = Path::new("models").join(short_name);
    if default_dir.exists() { return Ok(default_dir); }
    Err(anyhow!(
        "Could not locate model directory for {}; place tokenizer.json, config.json and model.safetensors in {} or set APP_MODEL_DIR",
        model_name,
        default_dir.display()
    ))
}
