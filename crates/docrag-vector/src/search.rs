use anyhow::Result;
use arrow_array::{Float32Array, Int32Array, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use docrag_core::types::{Chunk, DocumentMetadata, ScoredChunk};

use crate::table::column;

/// Cosine distance (1 - cos) mapped to a [0, 1] relevance; opposite or
/// orthogonal vectors score 0, as does an undefined (NaN) distance.
pub fn relevance_from_distance(distance: f32) -> f32 {
	if distance.is_nan() {
		return 0.0;
	}
	(1.0 - distance).clamp(0.0, 1.0)
}

pub async fn nearest(table: &Table, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
	let mut stream = table
		.vector_search(query_vec.to_vec())?
		.distance_type(DistanceType::Cosine)
		.limit(k)
		.execute()
		.await?;
	let mut hits = Vec::new();
	while let Some(batch) = stream.try_next().await? {
		hits.extend(batch_to_hits(&batch)?);
	}
	hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
	hits.truncate(k);
	Ok(hits)
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
	let ids = column::<StringArray>(batch, "id")?;
	let sources = column::<StringArray>(batch, "source")?;
	let starts = column::<Int64Array>(batch, "start_index")?;
	let contents = column::<StringArray>(batch, "content")?;
	let chunk_indices = column::<Int32Array>(batch, "chunk_index")?;
	let total_chunks = column::<Int32Array>(batch, "total_chunks")?;
	let distances = column::<Float32Array>(batch, "_distance")?;
	let hits = (0..batch.num_rows())
		.map(|i| ScoredChunk {
			chunk: Chunk {
				id: ids.value(i).to_string(),
				content: contents.value(i).to_string(),
				metadata: DocumentMetadata {
					source: sources.value(i).to_string(),
					start_index: Some(starts.value(i).max(0) as usize),
				},
				chunk_index: chunk_indices.value(i).max(0) as usize,
				total_chunks: total_chunks.value(i).max(0) as usize,
			},
			score: relevance_from_distance(distances.value(i)),
		})
		.collect();
	Ok(hits)
}
