//! LanceDB-backed vector store: wholesale index builds, loading and cosine
//! similarity search over chunk embeddings.

pub mod schema;
pub mod search;
pub mod store;
pub mod table;
pub mod writer;

pub use store::VectorStore;
pub use table::IndexMeta;
