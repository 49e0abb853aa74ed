use crate::types::ScoredChunk;

/// Maps text to fixed-dimension vectors.
///
/// Index build and query must use embedders with the same `embedder_id`,
/// otherwise scores are meaningless.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-ada-002:d1536`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for query"))
    }
}

/// A loaded, searchable vector index.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` nearest chunks, best first.
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<ScoredChunk>>;
    fn count(&self) -> anyhow::Result<usize>;
    /// Identifier of the embedder the index was built with, if recorded.
    fn embedder_id(&self) -> Option<&str>;
}

/// A text-in, text-out language model.
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;
    fn invoke(&self, prompt: &str) -> anyhow::Result<String>;
}
