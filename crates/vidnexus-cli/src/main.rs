mod progress;

use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use tokio::fs;
use tracing_subscriber::EnvFilter;

use vidnexus_core::{
    ChatModel, Pipeline, Provider, Settings, VidnexusError, YtDlpSource, extract_video_id,
    format_details_readable, format_elapsed, format_summary_readable, summary_file_name,
    watch_url,
};

use crate::progress::{BarReporter, create_spinner};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliProvider {
    Groq,
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Groq => Provider::Groq,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidnexus")]
#[command(
    about = "Fetch a YouTube transcript and produce a detailed chronological AI summary"
)]
struct Cli {
    /// YouTube URL (normal or Shorts)
    url: String,

    /// AI provider for summarization [default: groq]
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Model identifier, overriding the provider's default
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum words per transcript chunk [default: 150]
    #[arg(long)]
    max_words: Option<usize>,

    /// Summaries merged per model call; 1 merges pairwise in a chain [default: 1]
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Seconds to wait after every model call [default: 1.0]
    #[arg(long)]
    delay: Option<f64>,

    /// Retries per failed model call, with exponential backoff [default: 0]
    #[arg(long)]
    retries: Option<u32>,

    /// Preferred caption language [default: en]
    #[arg(short, long)]
    lang: Option<String>,

    /// Where to write the summary (defaults to "<title>_summary.txt")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the summary without writing a file
    #[arg(long)]
    no_save: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Settings {
        Settings {
            provider: self.provider.map(Provider::from),
            model: self.model.clone(),
            max_words: self.max_words,
            batch_size: self.batch_size,
            delay_secs: self.delay,
            max_retries: self.retries,
            caption_lang: self.lang.clone(),
            ..Settings::default()
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let settings = Settings::load(cli.config.as_deref())
        .await?
        .merge(cli.overrides());
    let agent = Arc::new(settings.agent_config());
    let pipeline_config = settings.pipeline_config()?;

    // Validate API key early
    let model = match ChatModel::new(Arc::clone(&agent)) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let video_id = extract_video_id(&cli.url)?;
    let url = watch_url(&video_id);

    println!(
        "\n{}  {}\n",
        style("vidnexus").cyan().bold(),
        style("YouTube Summarizer").dim()
    );

    let total_start = Instant::now();

    // Step 1: Video details
    let step_start = Instant::now();
    let source = YtDlpSource::with_lang(settings.caption_lang())?;
    let spinner = create_spinner("Fetching video details...");
    let probe = source.probe(&url).await?;
    spinner.finish_with_message(format!(
        "{} Fetched details {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_elapsed(step_start.elapsed()))).dim()
    ));

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_details_readable(&probe.details));
    if !probe.details.thumbnail.is_empty() {
        println!("{} {}\n", style("Thumbnail:").dim(), probe.details.thumbnail);
    }
    println!("{}", style("─".repeat(60)).dim());

    // Step 2: Transcript
    let step_start = Instant::now();
    let spinner = create_spinner("Downloading transcript...");
    let transcript = match &probe.caption_url {
        Some(caption_url) => source.download_transcript(caption_url).await?,
        None => None,
    };
    let Some(transcript) = transcript else {
        spinner.finish_and_clear();
        eprintln!(
            "{} Transcript unavailable; summarization not possible.",
            style("✗").red().bold()
        );
        return Err(VidnexusError::TranscriptUnavailable {
            identifier: video_id,
        }
        .into());
    };
    spinner.finish_with_message(format!(
        "{} Transcript downloaded {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_elapsed(step_start.elapsed()))).dim()
    ));

    // Step 3: Summarize
    let step_start = Instant::now();
    println!(
        "{} Summarizing with {} ({})",
        style("→").cyan().bold(),
        agent.provider.name(),
        style(&agent.model).dim()
    );
    let reporter = Arc::new(BarReporter::new(pipeline_config.batch_size));
    let pipeline = Pipeline::new(model, pipeline_config).with_reporter(reporter.clone());
    let summary = match pipeline.run(&transcript).await {
        Ok(summary) => summary,
        Err(e) => {
            reporter.bar().abandon();
            return Err(e.into());
        }
    };
    println!(
        "{} Summary ready {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_elapsed(step_start.elapsed()))).dim()
    );

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_summary_readable(&summary));
    println!("{}", style("─".repeat(60)).dim());

    if !cli.no_save {
        let path = cli
            .output
            .unwrap_or_else(|| PathBuf::from(summary_file_name(&probe.details.title)));
        fs::write(&path, summary.as_str()).await?;
        println!("{} {}", style("Saved:").dim(), style(path.display()).cyan());
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_elapsed(total_start.elapsed())).cyan().bold()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_setting_overrides() {
        let cli = Cli::try_parse_from([
            "vidnexus",
            "https://youtu.be/dQw4w9WgXcQ",
            "--provider",
            "gemini",
            "--batch-size",
            "3",
            "--delay",
            "0.5",
            "-vv",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.provider, Some(Provider::Gemini));
        assert_eq!(overrides.batch_size, Some(3));
        assert_eq!(overrides.delay_secs, Some(0.5));
        assert_eq!(overrides.max_words, None);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let cli = Cli::try_parse_from(["vidnexus", "https://youtu.be/dQw4w9WgXcQ"]).unwrap();
        let file = Settings {
            max_words: Some(90),
            ..Settings::default()
        };
        assert_eq!(file.merge(cli.overrides()).max_words, Some(90));
    }
}
