//! Prompt text sent to the summarization model.

use crate::types::{Chunk, Summary};

pub const AGENT_NAME: &str = "YouTube Summarizer";

pub const AGENT_ROLE: &str = "Detailed and Chronological YouTube Summarizer";

/// System instructions shared by every call.
pub const SUMMARIZER_INSTRUCTIONS: &str = "\
Create a detailed and accurate summary of the transcript, without skipping any events or facts. \
Include all key actions, dialogues, and information in chronological order exactly as they happen in the video. \
Do not add opinions, interpretations, or assumptions; only describe what is actually in the transcript.";

const MARKDOWN_INSTRUCTIONS: &str = "Format your response using markdown.";

/// Joined system message for the agent.
pub fn system_prompt(instructions: &str, markdown: bool) -> String {
    let mut prompt = format!(
        "You are {}, a {}.\n\n{}",
        AGENT_NAME, AGENT_ROLE, instructions
    );
    if markdown {
        prompt.push_str("\n\n");
        prompt.push_str(MARKDOWN_INSTRUCTIONS);
    }
    prompt
}

pub fn leaf_prompt(chunk: &Chunk) -> String {
    format!(
        "From the following transcript chunk, write a detailed chronological description \
covering all events, actions, and statements exactly as they appear, without skipping any details. \
Describe only what this chunk contains; do not omit anything, do not add opinions or interpretation, \
and do not invent content:\n\n{}",
        chunk.text()
    )
}

pub fn merge_prompt(group: &[Summary]) -> String {
    let body = group
        .iter()
        .map(Summary::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Combine the following detailed summaries into one chronological description, \
preserving all events and facts without removing any important points:\n\n{}",
        body
    )
}
