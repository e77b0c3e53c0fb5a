use std::fmt;

use thiserror::Error;

use crate::model::ModelError;

/// Where in the pipeline a model call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Summarizing a single transcript chunk.
    Leaf,
    /// Merging a group of summaries in the given reduction pass (1-based).
    Merge { pass: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Leaf => write!(f, "leaf pass"),
            Stage::Merge { pass } => write!(f, "merge pass {}", pass),
        }
    }
}

#[derive(Error, Debug)]
pub enum VidnexusError {
    #[error("No content to summarize: the transcript is empty")]
    EmptyContent,

    #[error("Model invocation failed during {stage} at index {index}: {source}")]
    ModelInvocation {
        stage: Stage,
        index: usize,
        #[source]
        source: ModelError,
    },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Couldn't extract a valid YouTube video ID from {url}")]
    InvalidVideoUrl { url: String },

    #[error("Fetching video metadata failed for {url}: {reason}")]
    MetadataFailed { url: String, reason: String },

    #[error("Transcript unavailable for {identifier}")]
    TranscriptUnavailable { identifier: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

impl VidnexusError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        VidnexusError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether running again with the same input could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VidnexusError::ModelInvocation { .. } | VidnexusError::ApiError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VidnexusError>;
