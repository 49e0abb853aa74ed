//! Recursive character splitting.
//!
//! Text is cut at the coarsest separator present (paragraph, line, sentence,
//! word, then single characters), pieces that are still too long are split
//! again with the finer separators, and the resulting small pieces are merged
//! greedily into chunks of at most `chunk_size` characters. Each emitted chunk
//! leaves up to `chunk_overlap` characters of trailing pieces in the window,
//! which become the head of the next chunk.
//!
//! A separator stays with the piece it ends, so a sentence chunk ends with its
//! `.` and the next one starts at the following word. Splitters that attach
//! the separator to the next piece instead can shift a chunk boundary by one
//! separator; after trimming, only the `". "` level shows the difference.

use std::collections::VecDeque;
use std::path::Path;

use crate::config::SplitterSettings;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, DocumentMetadata};

pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn from_settings(settings: &SplitterSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Splits every document, tagging chunks with their source and start offset.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            let pieces = self.split_text(&doc.content);
            let total_chunks = pieces.len();
            let stem = Path::new(&doc.metadata.source)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| doc.metadata.source.clone());
            let mut previous: Option<(usize, usize)> = None;
            for (chunk_index, content) in pieces.into_iter().enumerate() {
                let from = previous
                    .map(|(start, len)| (start + len).saturating_sub(self.chunk_overlap))
                    .unwrap_or(0);
                let start = find_char_offset(&doc.content, &content, from)
                    .or_else(|| find_char_offset(&doc.content, &content, 0))
                    .unwrap_or(from);
                previous = Some((start, char_len(&content)));
                chunks.push(Chunk {
                    id: format!("{}:{}", stem, chunk_index),
                    content,
                    metadata: DocumentMetadata {
                        source: doc.metadata.source.clone(),
                        start_index: Some(start),
                    },
                    chunk_index,
                    total_chunks,
                });
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);
        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_pieces(&small));
                small.clear();
            }
            if finer.is_empty() {
                chunks.extend(trimmed(piece));
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge_pieces(&small));
        }
        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                chunks.extend(join_window(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        chunks.extend(join_window(&window));
        chunks
    }
}

fn pick_separator<'s>(text: &str, separators: &'s [String]) -> (&'s str, &'s [String]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep.as_str()) {
            return (sep, &separators[i + 1..]);
        }
    }
    (separators.last().map(String::as_str).unwrap_or(""), &[])
}

/// Separators stay attached to the end of the piece they terminate.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
    } else {
        text.split_inclusive(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn join_window(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    trimmed(&joined)
}

fn trimmed(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character offset of `needle` in `haystack`, searching from character `from`.
fn find_char_offset(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let byte_from = haystack
        .char_indices()
        .nth(from)
        .map(|(b, _)| b)
        .unwrap_or(haystack.len());
    haystack[byte_from..]
        .find(needle)
        .map(|rel| from + haystack[byte_from..byte_from + rel].chars().count())
}
