//! Segment → summarize → reduce, one model call at a time.

use std::{sync::Arc, time::Duration};

use tracing::{error, info};

use crate::{
    error::{Result, VidnexusError},
    model::SummaryModel,
    pacing::{DEFAULT_DELAY, Pacer},
    progress::{NoopReporter, PipelineEvent, ProgressReporter},
    reduce::Reducer,
    retry::{RetryPolicy, RetryingModel},
    segment::{DEFAULT_MAX_WORDS, Segmenter},
    summarize::LeafSummarizer,
    types::{Summary, Transcript},
};

pub const DEFAULT_BATCH_SIZE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub max_words: usize,
    pub batch_size: usize,
    pub delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Rejects negative, NaN and infinite values.
    pub fn with_delay_secs(self, secs: f64) -> Result<Self> {
        let delay = Duration::try_from_secs_f64(secs).map_err(|_| {
            VidnexusError::config(format!(
                "delay must be a finite, non-negative number of seconds, got {}",
                secs
            ))
        })?;
        Ok(self.with_delay(delay))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(VidnexusError::config("max_words must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(VidnexusError::config("batch_size must be greater than 0"));
        }
        Ok(())
    }
}

/// One summarization run per `run` call. Holds no state between runs.
pub struct Pipeline<M> {
    model: M,
    config: PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl<M: SummaryModel> Pipeline<M> {
    pub fn new(model: M, config: PipelineConfig) -> Self {
        Self {
            model,
            config,
            reporter: Arc::new(NoopReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, transcript: &Transcript) -> Result<Summary> {
        self.config.validate()?;
        if transcript.is_blank() {
            return Err(VidnexusError::EmptyContent);
        }

        let chunks = Segmenter::new(self.config.max_words).segment(transcript);
        if chunks.is_empty() {
            return Err(VidnexusError::EmptyContent);
        }

        let reporter = self.reporter.as_ref();
        reporter.report(&PipelineEvent::Segmented {
            chunks: chunks.len(),
            words: transcript.word_count(),
        });
        info!(
            chunks = chunks.len(),
            batch_size = self.config.batch_size,
            "starting summarization"
        );

        let model = RetryingModel::new(&self.model, self.config.retry);
        let pacer = Pacer::new(self.config.delay);

        let summarizer = LeafSummarizer::new(&model);
        let mut leaves = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let summary = summarizer.summarize_chunk(chunk).await.inspect_err(|e| {
                error!(chunk = chunk.index, total = chunks.len(), "leaf summary failed: {}", e)
            })?;
            pacer.pause().await;
            leaves.push(summary);
            reporter.report(&PipelineEvent::LeafCompleted {
                index: chunk.index,
                total: chunks.len(),
            });
        }
        reporter.report(&PipelineEvent::PassCompleted {
            pass: 0,
            size: leaves.len(),
        });

        let reducer = Reducer::new(&model, &pacer, reporter);
        let summary = reducer
            .reduce(leaves, self.config.batch_size)
            .await
            .inspect_err(|e| error!("merge failed: {}", e))?
            .ok_or(VidnexusError::EmptyContent)?;

        let passes = reducer.passes() + 1;
        info!(passes, model_calls = pacer.calls(), "summarization finished");
        reporter.report(&PipelineEvent::Finished {
            passes,
            model_calls: pacer.calls(),
        });

        Ok(summary)
    }
}

/// Runs a fresh pipeline over `transcript`.
pub async fn run<M: SummaryModel>(
    model: M,
    transcript: &Transcript,
    config: PipelineConfig,
) -> Result<Summary> {
    Pipeline::new(model, config).run(transcript).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_words, 150);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.delay, Duration::from_secs(1));
        assert!(!config.retry.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = PipelineConfig::default().with_max_words(0).validate();
        assert!(matches!(err, Err(VidnexusError::Configuration { .. })));

        let err = PipelineConfig::default().with_batch_size(0).validate();
        assert!(matches!(err, Err(VidnexusError::Configuration { .. })));
    }

    #[test]
    fn delay_seconds_must_be_non_negative() {
        let config = PipelineConfig::default().with_delay_secs(0.25).unwrap();
        assert_eq!(config.delay, Duration::from_millis(250));

        assert!(PipelineConfig::default().with_delay_secs(-1.0).is_err());
        assert!(PipelineConfig::default().with_delay_secs(f64::NAN).is_err());
    }
}
