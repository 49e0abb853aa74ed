//! Domain types flowing through the indexer and the query path.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Where a piece of text came from.
///
/// `start_index` is the character offset inside the source document. It is
/// `None` for whole documents and always set on chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub start_index: Option<usize>,
}

/// One loaded input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: DocumentMetadata { source: source.into(), start_index: None },
        }
    }
}

/// A slice of a document that is embedded and indexed on its own.
///
/// - `id`: `<file stem>:<chunk_index>`
/// - `metadata`: parent's source plus the chunk's start offset
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl Chunk {
    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

/// A search hit. `score` is a relevance in [0, 1]; higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
