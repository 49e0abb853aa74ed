use clap::Parser;

use docrag_cli::{init_logging, is_index_missing, load_settings};
use docrag_embed::build_embedder;
use docrag_llm::build_model;
use docrag_pipeline::report::{format_answer, format_preview, format_scored, NO_RELEVANT_RESULTS};
use docrag_pipeline::{QueryEngine, QueryOutcome};
use docrag_vector::VectorStore;

/// Answers a question from the indexed documents.
#[derive(Parser)]
#[command(name = "docrag-query", version)]
struct Args {
    /// The query text.
    query_text: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();
    let settings = load_settings()?;

    let store = match VectorStore::open(&settings.data.index_dir()) {
        Ok(store) => store,
        Err(e) if is_index_missing(&e) => {
            println!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    println!("Number of documents in index: {}", store.count()?);

    let embedder = build_embedder(&settings.embedding)?;
    let engine = QueryEngine::new(&store, embedder.as_ref(), settings.query);

    let retrieval = engine.retrieve(&args.query_text)?;
    if settings.query.preview_k > 0 {
        println!("\n{}", format_preview(&retrieval.preview));
    }
    println!("\n{}", format_scored(&retrieval.results));

    // The model (and its API key) is only needed once a hit passes the threshold.
    match engine.answer_with(&args.query_text, retrieval, || build_model(&settings.llm))? {
        QueryOutcome::Answered(answer) => println!("\n{}", format_answer(&answer)),
        QueryOutcome::NoRelevantResults(_) => println!("{}", NO_RELEVANT_RESULTS),
    }
    Ok(())
}
