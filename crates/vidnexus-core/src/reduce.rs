//! Hierarchical merging of summaries into one.
//!
//! Each pass splits the current summaries into contiguous groups of up to
//! `batch_size` and replaces every group with one merged summary. Passes
//! repeat until a single summary remains.
//!
//! `batch_size == 1` would never shrink the list, so it runs as a pairwise
//! chain instead: every pass merges the first two summaries and carries the
//! rest over unchanged, taking exactly `n - 1` passes.

use std::{
    ops::Range,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::{debug, info};

use crate::{
    error::{Result, Stage, VidnexusError},
    model::SummaryModel,
    pacing::Pacer,
    progress::{PipelineEvent, ProgressReporter},
    prompts::merge_prompt,
    types::Summary,
};

/// Ranges of the summaries merged by model calls in one pass.
///
/// For `batch_size >= 2` the ranges are contiguous, non-overlapping and cover
/// `0..len`. In chain mode only `0..2` is merged.
pub fn merge_groups(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    if len <= 1 {
        return Vec::new();
    }
    if batch_size <= 1 {
        return vec![0..2];
    }
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

/// Length of every pass, starting with `len` and ending with 1.
pub fn pass_sizes(len: usize, batch_size: usize) -> Vec<usize> {
    let mut sizes = vec![len];
    let mut current = len;
    while current > 1 {
        let groups = merge_groups(current, batch_size).len();
        current = if batch_size <= 1 {
            current - 1
        } else {
            groups
        };
        sizes.push(current);
    }
    sizes
}

/// Total merge calls needed to reduce `len` summaries to one.
pub fn merge_call_count(len: usize, batch_size: usize) -> usize {
    pass_sizes(len, batch_size)
        .iter()
        .map(|&size| merge_groups(size, batch_size).len())
        .sum()
}

pub struct Reducer<'a, M: ?Sized> {
    model: &'a M,
    pacer: &'a Pacer,
    reporter: &'a dyn ProgressReporter,
    passes: AtomicUsize,
}

impl<'a, M: SummaryModel + ?Sized> Reducer<'a, M> {
    pub fn new(model: &'a M, pacer: &'a Pacer, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            model,
            pacer,
            reporter,
            passes: AtomicUsize::new(0),
        }
    }

    /// Merge passes completed so far.
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Relaxed)
    }

    /// Merges until at most one summary is left. Empty input yields `None`.
    pub async fn reduce(
        &self,
        summaries: Vec<Summary>,
        batch_size: usize,
    ) -> Result<Option<Summary>> {
        let mut current = summaries;
        let mut pass = 0;

        while current.len() > 1 {
            pass += 1;
            current = self.merge_pass(pass, current, batch_size).await?;
            self.passes.fetch_add(1, Ordering::Relaxed);
            self.reporter.report(&PipelineEvent::PassCompleted {
                pass,
                size: current.len(),
            });
        }

        Ok(current.pop())
    }

    /// Runs one pass and returns the next, shorter, sequence.
    pub async fn merge_pass(
        &self,
        pass: usize,
        summaries: Vec<Summary>,
        batch_size: usize,
    ) -> Result<Vec<Summary>> {
        let groups = merge_groups(summaries.len(), batch_size);
        let merged_len = groups.last().map(|r| r.end).unwrap_or(0);
        let outputs = groups.len() + (summaries.len() - merged_len);
        info!(
            pass,
            inputs = summaries.len(),
            groups = groups.len(),
            outputs,
            "starting merge pass"
        );
        self.reporter.report(&PipelineEvent::PassStarted {
            pass,
            inputs: summaries.len(),
            groups: groups.len(),
            outputs,
        });

        let mut next = Vec::with_capacity(groups.len());
        for (index, range) in groups.iter().enumerate() {
            let merged = self.merge_group(pass, index, &summaries[range.clone()]).await?;
            next.push(merged);
            self.reporter.report(&PipelineEvent::MergeCompleted {
                pass,
                group: index,
                groups: groups.len(),
            });
        }

        next.extend(summaries.into_iter().skip(merged_len));
        Ok(next)
    }

    async fn merge_group(&self, pass: usize, index: usize, group: &[Summary]) -> Result<Summary> {
        debug!(pass, group = index, size = group.len(), "merging group");

        let output = self
            .model
            .generate(&merge_prompt(group))
            .await
            .map_err(|source| VidnexusError::ModelInvocation {
                stage: Stage::Merge { pass },
                index,
                source,
            })?;
        self.pacer.pause().await;

        Ok(Summary::new(output.into_text()))
    }
}
