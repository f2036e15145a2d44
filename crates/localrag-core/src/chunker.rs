//! Word-window document splitter.
//!
//! Splits a cleaned document into windows of `split_length` words where each
//! window shares `split_overlap` words with the previous one. With
//! `respect_sentence_boundary` a window that would end mid-sentence is
//! extended to the next sentence end, and the following window starts at a
//! sentence start inside the overlap region.

use crate::config::SplitterSettings;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy)]
pub struct DocumentSplitter {
    split_length: usize,
    split_overlap: usize,
    respect_sentence_boundary: bool,
}

impl DocumentSplitter {
    pub fn new(split_length: usize, split_overlap: usize, respect_sentence_boundary: bool) -> Result<Self> {
        SplitterSettings { split_length, split_overlap, respect_sentence_boundary }.validate()?;
        Ok(Self { split_length, split_overlap, respect_sentence_boundary })
    }

    pub fn from_settings(settings: &SplitterSettings) -> Result<Self> {
        Self::new(settings.split_length, settings.split_overlap, settings.respect_sentence_boundary)
    }

    pub fn split(&self, doc: &Document) -> Vec<Chunk> {
        let spans = word_spans(&doc.text);
        let words: Vec<&str> = spans.iter().map(|&(s, e)| &doc.text[s..e]).collect();
        let windows = self.windows(&words);
        let total_chunks = windows.len();
        windows
            .into_iter()
            .enumerate()
            .map(|(ordinal, (start, end))| Chunk {
                id: Chunk::chunk_id(&doc.id, ordinal),
                doc_id: doc.id.clone(),
                ordinal,
                total_chunks,
                word_start: start,
                word_end: end,
                text: doc.text[spans[start].0..spans[end - 1].1].to_string(),
                prev_id: ordinal.checked_sub(1).map(|p| Chunk::chunk_id(&doc.id, p)),
                next_id: (ordinal + 1 < total_chunks).then(|| Chunk::chunk_id(&doc.id, ordinal + 1)),
                meta: doc.meta.clone(),
            })
            .collect()
    }

    /// Half-open word ranges of every window, in document order.
    fn windows(&self, words: &[&str]) -> Vec<(usize, usize)> {
        let n = words.len();
        let mut out = Vec::new();
        if n == 0 {
            return out;
        }
        let mut start = 0;
        loop {
            let mut end = (start + self.split_length).min(n);
            if self.respect_sentence_boundary {
                end = next_sentence_end(words, end);
            }
            out.push((start, end));
            if end >= n {
                break;
            }
            let overlap_start = end - self.split_overlap;
            start = if self.respect_sentence_boundary {
                (overlap_start..end).find(|&i| starts_sentence(words, i)).unwrap_or(end)
            } else {
                overlap_start
            };
        }
        out
    }
}

/// `chunk(document, split_length, split_overlap, respect_sentence_boundary)`.
pub fn chunk(doc: &Document, split_length: usize, split_overlap: usize, respect_sentence_boundary: bool) -> Result<Vec<Chunk>> {
    let splitter = DocumentSplitter::new(split_length, split_overlap, respect_sentence_boundary)?;
    Ok(splitter.split(doc))
}

/// Byte spans of whitespace-separated words.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

pub(crate) fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(|c| matches!(c, '"' | '\'' | ')' | ']' | '}' | '\u{201d}' | '\u{2019}'))
        .ends_with(|c| matches!(c, '.' | '!' | '?'))
}

fn starts_sentence(words: &[&str], i: usize) -> bool { i == 0 || ends_sentence(words[i - 1]) }

/// Smallest `e >= end` such that the window `[.., e)` ends on a sentence end,
/// or the word count if the last sentence is unterminated.
fn next_sentence_end(words: &[&str], end: usize) -> usize {
    let mut e = end;
    while e < words.len() && !ends_sentence(words[e - 1]) {
        e += 1;
    }
    e
}
