use docrag_core::types::ScoredChunk;

/// Separator placed between retrieved chunks in the prompt context.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Joins the text of the first `context_k` hits, best first.
pub fn build_context(hits: &[ScoredChunk], context_k: usize) -> String {
    hits.iter()
        .take(context_k)
        .map(|h| h.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// Fills the answer template. Placeholders are not re-expanded, so braces in
/// the context or question come through untouched.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context, please answer the question. \n\
         If you cannot find the exact answer, summarize what you know about the subject from the context.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::types::{Chunk, DocumentMetadata};

    fn hit(content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: format!("doc:{}", content.len()),
                content: content.to_string(),
                metadata: DocumentMetadata { source: "doc.md".into(), start_index: Some(0) },
                chunk_index: 0,
                total_chunks: 1,
            },
            score,
        }
    }

    #[test]
    fn context_joins_first_hits_with_delimiter() {
        let hits = vec![hit("one", 0.9), hit("two", 0.8), hit("three", 0.7), hit("four", 0.6)];
        assert_eq!(build_context(&hits, 3), "one\n\n---\n\ntwo\n\n---\n\nthree");
        assert_eq!(build_context(&hits[..1], 3), "one");
        assert_eq!(build_context(&[], 3), "");
    }

    #[test]
    fn prompt_places_context_before_question() {
        let prompt = build_prompt("The capital of France is Paris.", "What is the capital of France?");
        assert!(prompt.starts_with("Based on the following context, please answer the question. \nIf you cannot"));
        assert!(prompt.contains("\n\nContext:\nThe capital of France is Paris.\n\nQuestion: What is the capital of France?\n\nAnswer:"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn braces_in_inputs_are_literal() {
        let prompt = build_prompt("{question}", "{context}?");
        assert!(prompt.contains("Context:\n{question}\n"));
        assert!(prompt.contains("Question: {context}?"));
    }
}
