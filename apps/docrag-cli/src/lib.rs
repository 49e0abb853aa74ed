//! Start-up plumbing shared by the `docrag-index` and `docrag-query` binaries.

use anyhow::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docrag_core::config::{load_env_file, Config, Settings};
use docrag_core::Error;

/// Logs go to stderr so stdout carries only results. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads `.env`, then the layered configuration.
pub fn load_settings() -> Result<Settings> {
    load_env_file();
    let settings = Config::load()?.settings()?;
    debug!(variant = ?settings.pipeline.variant, "settings loaded");
    Ok(settings)
}

pub fn is_index_missing(err: &anyhow::Error) -> bool {
    err.chain().any(|e| matches!(e.downcast_ref::<Error>(), Some(Error::IndexMissing(_))))
}
