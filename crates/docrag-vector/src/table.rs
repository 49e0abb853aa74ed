//! LanceDB connection and housekeeping helpers.
//!
//! Provides the database open function, table presence checks, typed column
//! access and the key/value `index_meta` table that records which embedder
//! built the index.

use anyhow::{anyhow, Result};
use arrow_array::{Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::{build_meta_schema, META_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

pub(crate) fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("column '{}' missing or of unexpected type", name))
}

/// What the index records about how it was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMeta {
    pub embedder_id: Option<String>,
    pub dim: Option<usize>,
    pub chunk_count: Option<usize>,
    pub built_at: Option<String>,
}

impl IndexMeta {
    fn from_entries(mut entries: HashMap<String, String>) -> Self {
        Self {
            embedder_id: entries.remove("embedder_id"),
            dim: entries.remove("dim").and_then(|v| v.parse().ok()),
            chunk_count: entries.remove("chunk_count").and_then(|v| v.parse().ok()),
            built_at: entries.remove("built_at"),
        }
    }

    fn to_entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.embedder_id { out.push(("embedder_id", v.clone())); }
        if let Some(v) = self.dim { out.push(("dim", v.to_string())); }
        if let Some(v) = self.chunk_count { out.push(("chunk_count", v.to_string())); }
        if let Some(v) = &self.built_at { out.push(("built_at", v.clone())); }
        out
    }
}

/// Creates the meta table; only called on a freshly created database.
pub async fn write_meta(conn: &Connection, meta: &IndexMeta) -> Result<()> {
    let entries = meta.to_entries();
    let now = Utc::now().timestamp_millis();
    let rb = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(entries.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(entries.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>())),
            Arc::new(TimestampMillisecondArray::from(vec![now; entries.len()])),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
    conn.create_table(META_TABLE, reader).execute().await?;
    Ok(())
}

/// Missing meta table (an index from an older build) reads as empty.
pub async fn read_meta(conn: &Connection) -> Result<IndexMeta> {
    if !has_table(conn, META_TABLE).await? { return Ok(IndexMeta::default()); }
    let t = conn.open_table(META_TABLE).execute().await?;
    let mut entries = HashMap::new();
    let mut stream = t.query().execute().await?;
    while let Some(batch) = stream.try_next().await? {
        let keys = column::<StringArray>(&batch, "key")?;
        let values = column::<StringArray>(&batch, "value")?;
        for i in 0..batch.num_rows() {
            entries.insert(keys.value(i).to_string(), values.value(i).to_string());
        }
    }
    Ok(IndexMeta::from_entries(entries))
}
