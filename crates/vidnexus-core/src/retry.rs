//! Bounded retry with exponential backoff around model calls.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::model::{ModelError, ModelOutput, SummaryModel};

/// Retry settings. `max_retries == 0` disables retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Wraps a model so that transient failures are retried per `RetryPolicy`.
pub struct RetryingModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: SummaryModel> RetryingModel<M> {
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<M: SummaryModel> SummaryModel for RetryingModel<M> {
    async fn generate(&self, prompt: &str) -> Result<ModelOutput, ModelError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.policy.max_retries && e.is_transient() => {
                    let backoff = self.policy.backoff(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "model call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
