//! Vidnexus Core Library
//!
//! Splits a video transcript into sentence-bounded chunks, summarizes each
//! chunk with a language model and merges the summaries pass by pass into one
//! chronological description.

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod pacing;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod reduce;
pub mod retry;
pub mod segment;
pub mod source;
pub mod summarize;
pub mod types;

// Re-export commonly used items at crate root
pub use config::Settings;
pub use error::{Result, Stage, VidnexusError};
pub use format::{
    format_count, format_date, format_details_readable, format_elapsed, format_summary_readable,
    format_video_duration, summary_file_name, truncate_description,
};
pub use model::{AgentConfig, ChatModel, ModelError, ModelOutput, SummaryModel};
pub use pacing::Pacer;
pub use pipeline::{Pipeline, PipelineConfig, run};
pub use progress::{NoopReporter, PipelineEvent, ProgressReporter};
pub use provider::{Provider, ProviderConfig};
pub use reduce::{Reducer, merge_call_count, merge_groups, pass_sizes};
pub use retry::{RetryPolicy, RetryingModel};
pub use segment::{Segmenter, segment, split_sentences};
pub use source::{TranscriptSource, VideoProbe, YtDlpSource, extract_video_id, watch_url};
pub use summarize::LeafSummarizer;
pub use types::{Chunk, Summary, Transcript, VideoDetails};
