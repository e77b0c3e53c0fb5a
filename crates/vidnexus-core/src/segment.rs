//! Sentence-bounded transcript chunking.

use tracing::debug;

use crate::types::{Chunk, Transcript};

pub const DEFAULT_MAX_WORDS: usize = 150;

/// Splits text into sentences at `.`, `!` or `?` followed by whitespace.
///
/// Whitespace inside a sentence is collapsed to single spaces. A trailing
/// fragment without terminal punctuation is kept as the last sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(current.join(" "));
    }

    sentences
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_words: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

impl Segmenter {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn segment(&self, transcript: &Transcript) -> Vec<Chunk> {
        segment(transcript.text(), self.max_words)
    }
}

/// Greedily packs whole sentences into chunks of at most `max_words` words.
///
/// A sentence is never split, so a chunk holding a single long sentence may
/// exceed the limit. Blank input yields no chunks.
pub fn segment(text: &str, max_words: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut sentences: Vec<String> = Vec::new();
    let mut word_count = 0;

    for sentence in split_sentences(text) {
        let len = sentence.split_whitespace().count();
        if word_count + len > max_words && !sentences.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                sentences: std::mem::take(&mut sentences),
                word_count,
            });
            word_count = 0;
        }
        sentences.push(sentence);
        word_count += len;
    }

    if !sentences.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            sentences,
            word_count,
        });
    }

    debug!(chunks = chunks.len(), max_words, "segmented transcript");
    chunks
}
