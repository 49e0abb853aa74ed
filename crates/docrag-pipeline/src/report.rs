//! Plain-text rendering of pipeline results for the terminal.

use std::fmt::Write;

use docrag_core::types::{Chunk, ScoredChunk};

use crate::indexer::IndexReport;
use crate::query::Answer;

pub const NO_RELEVANT_RESULTS: &str = "Unable to find relevant results above threshold.";

const PREVIEW_CHARS: usize = 200;
const CONTEXT_PREVIEW_CHARS: usize = 500;

/// First `max_chars` characters, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}

/// Header plus the first 500 characters of the prompt context.
pub fn context_preview(context: &str) -> String {
    format!("Final context being used:\n{}", preview(context, CONTEXT_PREVIEW_CHARS))
}

pub fn format_index_report(report: &IndexReport) -> String {
    let mut out = format!("Split {} documents into {} chunks.\n", report.documents, report.chunks);
    if let Some(sample) = &report.sample {
        out.push_str(&format_sample(sample));
    }
    let _ = writeln!(out, "Saved {} chunks to {}.", report.chunks, report.index_dir.display());
    out
}

fn format_sample(chunk: &Chunk) -> String {
    let start = chunk.metadata.start_index.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    format!("{}\n{{source: {}, start_index: {}}}\n", chunk.content, chunk.source(), start)
}

/// Preview hits: content and source only.
pub fn format_preview(hits: &[ScoredChunk]) -> String {
    let mut out = String::from("Basic search results:\n");
    for (i, h) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "\nResult {}:\nContent: {}\nSource: {}\n",
            i + 1,
            preview(&h.chunk.content, PREVIEW_CHARS),
            h.chunk.source()
        );
    }
    out
}

pub fn format_scored(hits: &[ScoredChunk]) -> String {
    let mut out = String::from("Results with scores:\n");
    for (i, h) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "\nResult {}:\nScore: {:.4}\nContent: {}\nSource: {}\n",
            i + 1,
            h.score,
            preview(&h.chunk.content, PREVIEW_CHARS),
            h.chunk.source()
        );
    }
    out
}

pub fn format_answer(answer: &Answer) -> String {
    let mut out = format!("=== Final Response ===\n{}\n\nSources:\n", answer.response.trim());
    for s in &answer.sources {
        let _ = writeln!(out, "  - {} [{}] score={:.4}", s.source, s.chunk_id, s.score);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Retrieval, SourceRef};
    use std::path::PathBuf;

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn context_preview_shows_first_500_chars() {
        let context = format!("{}{}", "a".repeat(500), "b".repeat(20));
        let shown = context_preview(&context);
        assert_eq!(shown, format!("Final context being used:\n{}...", "a".repeat(500)));
        assert_eq!(context_preview("short"), "Final context being used:\nshort");
    }

    #[test]
    fn answer_lists_every_source_with_score() {
        let answer = Answer {
            response: " Paris \n".into(),
            context: String::new(),
            prompt: String::new(),
            sources: vec![
                SourceRef { source: "data/books/france.md".into(), chunk_id: "france:0".into(), score: 0.8312 },
                SourceRef { source: "data/books/misc.md".into(), chunk_id: "misc:4".into(), score: 0.25 },
            ],
            retrieval: Retrieval::default(),
        };
        let text = format_answer(&answer);
        assert!(text.starts_with("=== Final Response ===\nParis\n"));
        assert!(text.contains("  - data/books/france.md [france:0] score=0.8312\n"));
        assert!(text.contains("  - data/books/misc.md [misc:4] score=0.2500\n"));
    }

    #[test]
    fn index_report_without_sample() {
        let report = IndexReport { documents: 2, chunks: 7, index_dir: PathBuf::from("index"), sample: None };
        assert_eq!(format_index_report(&report), "Split 2 documents into 7 chunks.\nSaved 7 chunks to index.\n");
    }
}
