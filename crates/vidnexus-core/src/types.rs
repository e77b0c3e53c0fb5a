use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized plain transcript text for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<String> for Transcript {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Transcript {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A contiguous run of transcript sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub sentences: Vec<String>,
    pub word_count: usize,
}

impl Chunk {
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }
}

/// Generated description of a chunk or of a group of summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(String);

impl Summary {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata shown alongside a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub thumbnail: String,
    pub uploader: String,
    pub upload_date: String,
    pub view_count: u64,
    pub duration: u64,
    pub description: String,
}

impl Default for VideoDetails {
    fn default() -> Self {
        Self {
            title: "Unknown Title".to_string(),
            thumbnail: String::new(),
            uploader: "Unknown Uploader".to_string(),
            upload_date: String::new(),
            view_count: 0,
            duration: 0,
            description: String::new(),
        }
    }
}
