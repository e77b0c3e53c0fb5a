/// Progress signals emitted while a pipeline run advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Segmented { chunks: usize, words: usize },
    LeafCompleted { index: usize, total: usize },
    /// A merge pass (1-based) is about to make `groups` model calls, turning
    /// `inputs` summaries into `outputs`.
    PassStarted {
        pass: usize,
        inputs: usize,
        groups: usize,
        outputs: usize,
    },
    MergeCompleted { pass: usize, group: usize, groups: usize },
    /// Pass 0 is the leaf pass.
    PassCompleted { pass: usize, size: usize },
    /// `passes` counts the leaf pass too.
    Finished { passes: usize, model_calls: usize },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &PipelineEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn report(&self, event: &PipelineEvent) {
        self(event)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: &PipelineEvent) {}
}
