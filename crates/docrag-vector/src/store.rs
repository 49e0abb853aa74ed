use anyhow::Result;
use chrono::Utc;
use lancedb::{Connection, Table};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;

use docrag_core::traits::VectorIndex;
use docrag_core::types::{Chunk, ScoredChunk};
use docrag_core::Error;

use crate::schema::CHUNKS_TABLE;
use crate::search::nearest;
use crate::table::{has_table, open_db, read_meta, write_meta, IndexMeta};
use crate::writer::{check_rows, LanceIndexWriter};

/// A persisted chunk index in a LanceDB directory.
///
/// Callers see a blocking API; the store owns the runtime that drives
/// LanceDB's async calls.
pub struct VectorStore {
	table: Table,
	_db: Connection,
	meta: IndexMeta,
	dir: PathBuf,
	rt: Runtime,
}

impl VectorStore {
	/// Replaces whatever index lives in `dir` with one built from `chunks`.
	/// Rows are checked first; a rejected build leaves the old index in place.
	pub fn build(dir: &Path, chunks: &[Chunk], embeddings: &[Vec<f32>], embedder_id: &str) -> Result<Self> {
		let dim = check_rows(chunks, embeddings)?;
		let rt = Runtime::new()?;
		let meta = IndexMeta {
			embedder_id: Some(embedder_id.to_string()),
			dim: Some(dim),
			chunk_count: Some(chunks.len()),
			built_at: Some(Utc::now().to_rfc3339()),
		};
		rt.block_on(async {
			let writer = LanceIndexWriter::create(dir, dim).await?;
			writer.index(chunks, embeddings).await?;
			write_meta(&writer.db, &meta).await
		})?;
		info!("Saved {} chunks to {}", chunks.len(), dir.display());
		Self::open_with(rt, dir)
	}

	/// Fails with [`Error::IndexMissing`] when no index has been built at `dir`.
	pub fn open(dir: &Path) -> Result<Self> {
		Self::open_with(Runtime::new()?, dir)
	}

	fn open_with(rt: Runtime, dir: &Path) -> Result<Self> {
		if !dir.is_dir() {
			return Err(Error::IndexMissing(dir.to_path_buf()).into());
		}
		let (db, table, meta) = rt.block_on(async {
			let db = open_db(dir.to_string_lossy().as_ref()).await?;
			if !has_table(&db, CHUNKS_TABLE).await? {
				return Err(anyhow::Error::from(Error::IndexMissing(dir.to_path_buf())));
			}
			let table = db.open_table(CHUNKS_TABLE).execute().await?;
			let meta = read_meta(&db).await?;
			Ok((db, table, meta))
		})?;
		Ok(Self { table, _db: db, meta, dir: dir.to_path_buf(), rt })
	}

	pub fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
		self.rt.block_on(nearest(&self.table, query_vec, k))
	}

	pub fn count(&self) -> Result<usize> {
		Ok(self.rt.block_on(self.table.count_rows(None))?)
	}

	pub fn meta(&self) -> &IndexMeta {
		&self.meta
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}
}

impl VectorIndex for VectorStore {
	fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
		self.search(query_vec, k)
	}

	fn count(&self) -> Result<usize> {
		VectorStore::count(self)
	}

	fn embedder_id(&self) -> Option<&str> {
		self.meta.embedder_id.as_deref()
	}
}
