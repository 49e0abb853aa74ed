use clap::Parser;

use docrag_cli::{init_logging, load_settings};
use docrag_embed::build_embedder;
use docrag_pipeline::report::format_index_report;
use docrag_pipeline::{IndexBuilder, IndexOutcome};

/// Builds the vector index from the configured document directory,
/// replacing any previous index.
#[derive(Parser)]
#[command(name = "docrag-index", version)]
struct Args {}

fn main() -> anyhow::Result<()> {
    let _args = Args::parse();
    init_logging();
    let settings = load_settings()?;
    let embedder = build_embedder(&settings.embedding)?;

    match IndexBuilder::from_settings(&settings, embedder.as_ref())?.run()? {
        IndexOutcome::Built(report) => print!("{}", format_index_report(&report)),
        IndexOutcome::NoDocuments => println!(
            "No documents matching '{}' found in {}; nothing to index.",
            settings.data.glob,
            settings.data.source_dir().display()
        ),
        IndexOutcome::NoChunks { documents } => {
            println!("Loaded {} documents but none contained text; nothing to index.", documents)
        }
    }
    Ok(())
}
