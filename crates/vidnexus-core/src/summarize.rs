use tracing::debug;

use crate::{
    error::{Result, Stage, VidnexusError},
    model::SummaryModel,
    prompts::leaf_prompt,
    types::{Chunk, Summary},
};

/// Turns one chunk into a detailed chronological description.
pub struct LeafSummarizer<'a, M: ?Sized> {
    model: &'a M,
}

impl<'a, M: SummaryModel + ?Sized> LeafSummarizer<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Makes exactly one model call. Failures carry the chunk index.
    pub async fn summarize_chunk(&self, chunk: &Chunk) -> Result<Summary> {
        debug!(chunk = chunk.index, words = chunk.word_count, "summarizing chunk");

        let output = self
            .model
            .generate(&leaf_prompt(chunk))
            .await
            .map_err(|source| VidnexusError::ModelInvocation {
                stage: Stage::Leaf,
                index: chunk.index,
                source,
            })?;

        Ok(Summary::new(output.into_text()))
    }
}
