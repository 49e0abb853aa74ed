use anyhow::Result;
use tracing::{info, warn};

use docrag_core::config::QuerySettings;
use docrag_core::traits::{Embedder, LanguageModel, VectorIndex};
use docrag_core::types::ScoredChunk;

use crate::prompt::{build_context, build_prompt};
use crate::report::context_preview;

/// Answers questions from an index. The language model is supplied per
/// answer, so a query that finds nothing relevant never needs one.
pub struct QueryEngine<'a> {
    index: &'a dyn VectorIndex,
    embedder: &'a dyn Embedder,
    settings: QuerySettings,
}

/// What the searches returned, before any answer is generated.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Unscored preview hits; empty when `preview_k` is 0.
    pub preview: Vec<ScoredChunk>,
    pub results: Vec<ScoredChunk>,
}

impl Retrieval {
    pub fn best_score(&self) -> Option<f32> {
        self.results.first().map(|h| h.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    pub source: String,
    pub chunk_id: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    pub context: String,
    pub prompt: String,
    /// The chunks that went into the context, best first.
    pub sources: Vec<SourceRef>,
    pub retrieval: Retrieval,
}

#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Answered(Answer),
    /// No hit reached the relevance threshold; the model was not called.
    NoRelevantResults(Retrieval),
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a dyn VectorIndex, embedder: &'a dyn Embedder, settings: QuerySettings) -> Self {
        Self { index, embedder, settings }
    }

    pub fn ask(&self, question: &str, model: &dyn LanguageModel) -> Result<QueryOutcome> {
        let retrieval = self.retrieve(question)?;
        self.answer(question, retrieval, model)
    }

    pub fn retrieve(&self, question: &str) -> Result<Retrieval> {
        match self.index.embedder_id() {
            Some(built_with) if built_with != self.embedder.embedder_id() => warn!(
                "index was built with {} but queries use {}; scores may be meaningless",
                built_with,
                self.embedder.embedder_id()
            ),
            None => warn!("index does not record its embedder"),
            _ => {}
        }

        let query_vec = self.embedder.embed_query(question)?;
        let preview = if self.settings.preview_k > 0 {
            let hits = self.index.search_vec(&query_vec, self.settings.preview_k)?;
            info!("Basic search returned {} results", hits.len());
            hits
        } else {
            Vec::new()
        };
        let results = self.index.search_vec(&query_vec, self.settings.k)?;
        info!(
            "Similarity search returned {} results (top score {:?})",
            results.len(),
            results.first().map(|h| h.score)
        );
        Ok(Retrieval { preview, results })
    }

    /// True when the best hit reaches the relevance threshold (inclusive).
    pub fn is_relevant(&self, retrieval: &Retrieval) -> bool {
        retrieval
            .best_score()
            .is_some_and(|s| s >= self.settings.relevance_threshold)
    }

    /// Like [`answer`](Self::answer), but `load_model` runs only once the
    /// relevance guard has passed.
    pub fn answer_with<F>(&self, question: &str, retrieval: Retrieval, load_model: F) -> Result<QueryOutcome>
    where
        F: FnOnce() -> Result<Box<dyn LanguageModel>>,
    {
        if !self.is_relevant(&retrieval) {
            return Ok(self.not_relevant(retrieval));
        }
        let model = load_model()?;
        self.answer(question, retrieval, model.as_ref())
    }

    /// Applies the relevance guard, then prompts the model with the best hits.
    pub fn answer(&self, question: &str, retrieval: Retrieval, model: &dyn LanguageModel) -> Result<QueryOutcome> {
        if !self.is_relevant(&retrieval) {
            return Ok(self.not_relevant(retrieval));
        }

        let context = build_context(&retrieval.results, self.settings.context_k);
        info!("{}", context_preview(&context));
        let prompt = build_prompt(&context, question);

        info!("Generating response with {}", model.model_name());
        let response = model.invoke(&prompt)?;

        let sources = retrieval
            .results
            .iter()
            .take(self.settings.context_k)
            .map(|h| SourceRef { source: h.chunk.source().to_string(), chunk_id: h.chunk.id.clone(), score: h.score })
            .collect();
        Ok(QueryOutcome::Answered(Answer { response, context, prompt, sources, retrieval }))
    }

    fn not_relevant(&self, retrieval: Retrieval) -> QueryOutcome {
        info!(
            "No result above relevance threshold {} (best {:?})",
            self.settings.relevance_threshold,
            retrieval.best_score()
        );
        QueryOutcome::NoRelevantResults(retrieval)
    }
}
