//! Video metadata and caption transcripts via yt-dlp.

use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    error::{Result, VidnexusError},
    types::{Transcript, VideoDetails},
};

const CAPTION_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_CAPTION_LANG: &str = "en";

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|/embed/|/v/|shorts/)([A-Za-z0-9_-]{11})").expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Pull the 11-character video id out of a watch, short, embed or youtu.be URL.
pub fn extract_video_id(url: &str) -> Result<String> {
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| VidnexusError::InvalidVideoUrl {
            url: url.to_string(),
        })
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Supplies the transcript for a video id or URL. `None` means no captions.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, identifier: &str) -> Result<Option<Transcript>>;
}

/// What a single yt-dlp probe tells us about a video.
#[derive(Debug, Clone)]
pub struct VideoProbe {
    pub details: VideoDetails,
    pub caption_url: Option<String>,
}

pub fn details_from_info(info: &Value) -> VideoDetails {
    let defaults = VideoDetails::default();
    let text = |key: &str, default: String| {
        info.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(default)
    };
    let number = |key: &str| {
        info.get(key)
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .unwrap_or(0)
    };

    VideoDetails {
        title: text("title", defaults.title),
        thumbnail: text("thumbnail", defaults.thumbnail),
        uploader: text("uploader", defaults.uploader),
        upload_date: text("upload_date", defaults.upload_date),
        view_count: number("view_count"),
        duration: number("duration"),
        description: text("description", defaults.description),
    }
}

fn non_empty_object<'a>(info: &'a Value, key: &str) -> Option<&'a serde_json::Map<String, Value>> {
    info.get(key)
        .and_then(Value::as_object)
        .filter(|map| !map.is_empty())
}

/// Automatic captions first, then uploaded subtitles; `lang` if present, else any.
pub fn pick_caption_url(info: &Value, lang: &str) -> Option<String> {
    let tracks = non_empty_object(info, "automatic_captions")
        .or_else(|| non_empty_object(info, "subtitles"))?;
    let formats = tracks
        .get(lang)
        .or_else(|| tracks.values().next())?
        .as_array()?;

    let url_of = |entry: &Value| entry.get("url").and_then(Value::as_str).map(str::to_string);
    formats
        .iter()
        .find(|entry| entry.get("ext").and_then(Value::as_str) == Some("vtt"))
        .and_then(url_of)
        .or_else(|| formats.first().and_then(url_of))
}

/// Strips markup and WebVTT framing, drops repeated caption lines, collapses whitespace.
///
/// Header, `NOTE` blocks, cue identifiers and cue timings are only recognized
/// in their structural positions, so spoken text that happens to look like
/// them is kept.
pub fn normalize_caption_text(raw: &str) -> String {
    let raw_lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let mut lines: Vec<String> = Vec::new();
    let mut i = 0;

    // Header block: `WEBVTT` up to the first blank line or cue timing.
    if raw_lines.first().is_some_and(|l| l.starts_with("WEBVTT")) {
        i = 1;
        while i < raw_lines.len()
            && !raw_lines[i].is_empty()
            && !raw_lines[i].contains("-->")
        {
            i += 1;
        }
    }

    let mut block_start = true;
    while i < raw_lines.len() {
        let line = raw_lines[i];
        i += 1;

        if line.is_empty() {
            block_start = true;
            continue;
        }
        let at_block_start = std::mem::replace(&mut block_start, false);

        if at_block_start && (line == "NOTE" || line.starts_with("NOTE ")) {
            while i < raw_lines.len() && !raw_lines[i].is_empty() {
                i += 1;
            }
            continue;
        }
        let is_cue_id =
            at_block_start && raw_lines.get(i).is_some_and(|next| next.contains("-->"));
        if is_cue_id || line.contains("-->") {
            continue;
        }

        let stripped = TAG_RE.replace_all(line, " ");
        let cleaned = WHITESPACE_RE
            .replace_all(&decode_entities(&stripped), " ")
            .trim()
            .to_string();
        if cleaned.is_empty() || lines.last() == Some(&cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub struct YtDlpSource {
    client: reqwest::Client,
    lang: String,
}

impl YtDlpSource {
    pub fn new() -> Result<Self> {
        Self::with_lang(DEFAULT_CAPTION_LANG)
    }

    pub fn with_lang(lang: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(CAPTION_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            lang: lang.into(),
        })
    }

    /// Run yt-dlp once without downloading the video.
    pub async fn probe(&self, url: &str) -> Result<VideoProbe> {
        let output = Command::new("yt-dlp")
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--quiet")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(VidnexusError::MetadataFailed {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        let caption_url = pick_caption_url(&info, &self.lang);
        debug!(has_captions = caption_url.is_some(), "probed video");

        Ok(VideoProbe {
            details: details_from_info(&info),
            caption_url,
        })
    }

    pub async fn download_transcript(&self, caption_url: &str) -> Result<Option<Transcript>> {
        let raw = self
            .client
            .get(caption_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = normalize_caption_text(&raw);
        if text.is_empty() {
            return Ok(None);
        }
        info!(words = text.split_whitespace().count(), "downloaded transcript");
        Ok(Some(Transcript::new(text)))
    }
}

#[async_trait]
impl TranscriptSource for YtDlpSource {
    async fn fetch_transcript(&self, identifier: &str) -> Result<Option<Transcript>> {
        let url = match extract_video_id(identifier) {
            Ok(_) => identifier.to_string(),
            Err(_) => watch_url(identifier),
        };

        match self.probe(&url).await?.caption_url {
            Some(caption_url) => self.download_transcript(&caption_url).await,
            None => Ok(None),
        }
    }
}
