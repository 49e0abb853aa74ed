use anyhow::{ensure, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use docrag_core::config::Settings;
use docrag_core::loader::DirectoryLoader;
use docrag_core::splitter::RecursiveSplitter;
use docrag_core::traits::Embedder;
use docrag_core::types::Chunk;
use docrag_vector::VectorStore;

/// Position of the chunk reported as a sample after splitting.
const SAMPLE_CHUNK: usize = 10;

/// Load, split, embed, store. Each run replaces the index wholesale.
pub struct IndexBuilder<'a> {
    loader: DirectoryLoader,
    splitter: RecursiveSplitter,
    embedder: &'a dyn Embedder,
    index_dir: PathBuf,
    batch_size: usize,
}

#[derive(Debug)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
    pub index_dir: PathBuf,
    pub sample: Option<Chunk>,
}

#[derive(Debug)]
pub enum IndexOutcome {
    Built(IndexReport),
    /// Nothing matched the glob; the previous index is left alone.
    NoDocuments,
    /// Documents were found but all of them were blank.
    NoChunks { documents: usize },
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        loader: DirectoryLoader,
        splitter: RecursiveSplitter,
        embedder: &'a dyn Embedder,
        index_dir: PathBuf,
        batch_size: usize,
    ) -> Self {
        Self { loader, splitter, embedder, index_dir, batch_size: batch_size.max(1) }
    }

    pub fn from_settings(settings: &Settings, embedder: &'a dyn Embedder) -> Result<Self> {
        let loader = DirectoryLoader::new(settings.data.source_dir(), &settings.data.glob)?;
        let splitter = RecursiveSplitter::from_settings(&settings.splitter)?;
        if embedder.dim() != settings.embedding.dimension {
            warn!(
                "embedder {} produces {}-dim vectors but embedding.dimension is {}",
                embedder.embedder_id(),
                embedder.dim(),
                settings.embedding.dimension
            );
        }
        Ok(Self::new(loader, splitter, embedder, settings.data.index_dir(), settings.embedding.batch_size))
    }

    pub fn run(&self) -> Result<IndexOutcome> {
        info!("Loading documents from {}", self.loader.root().display());
        let documents = self.loader.load()?;
        if documents.is_empty() {
            return Ok(IndexOutcome::NoDocuments);
        }

        let chunks = self.splitter.split_documents(&documents);
        info!("Split {} documents into {} chunks.", documents.len(), chunks.len());
        if chunks.is_empty() {
            return Ok(IndexOutcome::NoChunks { documents: documents.len() });
        }
        let sample = chunks.get(SAMPLE_CHUNK).cloned();
        if let Some(c) = &sample {
            debug!(source = %c.source(), start_index = ?c.metadata.start_index, "sample chunk: {}", c.content);
        }

        let embeddings = self.embed_chunks(&chunks)?;
        VectorStore::build(&self.index_dir, &chunks, &embeddings, self.embedder.embedder_id())
            .with_context(|| format!("failed to write index to {}", self.index_dir.display()))?;

        Ok(IndexOutcome::Built(IndexReport {
            documents: documents.len(),
            chunks: chunks.len(),
            index_dir: self.index_dir.clone(),
            sample,
        }))
    }

    fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        info!("Embedding {} chunks with {}", chunks.len(), self.embedder.embedder_id());
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedded {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            ensure!(
                vectors.len() == texts.len(),
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
            for v in &vectors {
                ensure!(v.len() == self.embedder.dim(), "embedding has {} dims, expected {}", v.len(), self.embedder.dim());
            }
            embeddings.extend(vectors);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(embeddings)
    }
}
