//! Shared building blocks for the docrag pipeline: configuration, domain
//! types, the embedder/index/model traits, and the loader and splitter that
//! turn a directory of Markdown files into chunks.

pub mod config;
pub mod error;
pub mod loader;
pub mod splitter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
