//! The two pipelines: building an index from a document directory, and
//! answering a question from that index with a language model.

pub mod indexer;
pub mod prompt;
pub mod query;
pub mod report;

pub use indexer::{IndexBuilder, IndexOutcome, IndexReport};
pub use query::{Answer, QueryEngine, QueryOutcome, Retrieval, SourceRef};
