use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use vidnexus_core::{PipelineEvent, ProgressReporter, merge_call_count};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Renders pipeline events as a single bar counting model calls.
pub struct BarReporter {
    bar: ProgressBar,
    batch_size: usize,
}

impl BarReporter {
    pub fn new(batch_size: usize) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} calls · {msg}")
                .unwrap()
                .progress_chars("=> ")
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar, batch_size }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressReporter for BarReporter {
    fn report(&self, event: &PipelineEvent) {
        match *event {
            PipelineEvent::Segmented { chunks, words } => {
                self.bar
                    .set_length((chunks + merge_call_count(chunks, self.batch_size)) as u64);
                self.bar.println(format!(
                    "{} Transcript: {} words split into {} chunks",
                    style("✓").green().bold(),
                    vidnexus_core::format_count(words as u64),
                    style(chunks).yellow()
                ));
                self.bar.set_message("Summarizing chunks...");
            }
            PipelineEvent::LeafCompleted { index, total } => {
                self.bar.inc(1);
                self.bar
                    .set_message(format!("Summarized chunk {}/{}", index + 1, total));
            }
            PipelineEvent::PassStarted {
                pass,
                inputs,
                groups,
                outputs,
            } => {
                self.bar.set_message(format!(
                    "Merge pass {}: {} summaries into {} ({} calls)",
                    pass, inputs, outputs, groups
                ));
            }
            PipelineEvent::MergeCompleted { .. } => self.bar.inc(1),
            PipelineEvent::PassCompleted { .. } => {}
            PipelineEvent::Finished {
                passes,
                model_calls,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "{} Summarized in {} passes with {} model calls",
                    style("✓").green().bold(),
                    passes,
                    model_calls
                );
            }
        }
    }
}
