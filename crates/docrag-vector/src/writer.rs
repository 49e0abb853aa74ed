use anyhow::Result;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use docrag_core::types::Chunk;
use docrag_core::Error;

use crate::schema::{build_chunks_schema, CHUNKS_TABLE};
use crate::table::open_db;

const BATCH_SIZE: usize = 1000;

/// Rejects rows that cannot form an index and returns their shared dimension.
pub fn check_rows(chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
	if chunks.is_empty() {
		return Err(Error::Operation("no chunks to index".into()).into());
	}
	if chunks.len() != embeddings.len() {
		return Err(Error::Operation(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())).into());
	}
	let dim = embeddings[0].len();
	if dim == 0 {
		return Err(Error::Operation("embeddings are empty".into()).into());
	}
	if let Some((i, e)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dim) {
		return Err(Error::Operation(format!("embedding {} has {} dims, expected {}", i, e.len(), dim)).into());
	}
	Ok(dim)
}

/// Writes a brand-new index; any previous index in the directory is deleted first.
pub struct LanceIndexWriter { pub(crate) db: Connection, dim: usize }

impl LanceIndexWriter {
	pub async fn create(dir: &Path, dim: usize) -> Result<Self> {
		if dir.exists() {
			info!("Removing previous index at {}", dir.display());
			std::fs::remove_dir_all(dir)?;
		}
		std::fs::create_dir_all(dir)?;
		let db = open_db(dir.to_string_lossy().as_ref()).await?;
		Ok(Self { db, dim })
	}

	pub async fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
		let dim = check_rows(chunks, embeddings)?;
		if dim != self.dim {
			return Err(Error::Operation(format!("embeddings have {} dims, writer expects {}", dim, self.dim)).into());
		}
		info!("Indexing {} chunks into table '{}'", chunks.len(), CHUNKS_TABLE);
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(
			ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
				.unwrap_or_else(|_| ProgressStyle::default_bar())
				.progress_chars("#>-"),
		);
		let mut created = false;
		for (chunk_batch, emb_batch) in chunks.chunks(BATCH_SIZE).zip(embeddings.chunks(BATCH_SIZE)) {
			let record_batch = self.rows_to_record_batch(chunk_batch, emb_batch)?;
			let schema = record_batch.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
			if created {
				self.db.open_table(CHUNKS_TABLE).execute().await?.add(reader).execute().await?;
			} else {
				self.db.create_table(CHUNKS_TABLE, reader).execute().await?;
				created = true;
			}
			pb.inc(chunk_batch.len() as u64);
		}
		pb.finish_with_message("index written");
		Ok(chunks.len())
	}

	fn rows_to_record_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.dim).map_err(|_| Error::Operation(format!("dimension {} too large", self.dim)))?;
		let schema = build_chunks_schema(dim);
		let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
		let sources: Vec<&str> = chunks.iter().map(|c| c.source()).collect();
		let starts: Vec<i64> = chunks.iter().map(|c| c.metadata.start_index.unwrap_or(0) as i64).collect();
		let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
		let chunk_indices: Vec<i32> = chunks.iter().map(|c| c.chunk_index as i32).collect();
		let total_chunks: Vec<i32> = chunks.iter().map(|c| c.total_chunks as i32).collect();
		let vectors = embeddings.iter().map(|e| Some(e.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(Int64Array::from(starts)),
			Arc::new(StringArray::from(contents)),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(Int32Array::from(total_chunks)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
		])?;
		Ok(record_batch)
	}
}
