use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;
use vidnexus_core::{
    ModelError, ModelOutput, Pipeline, PipelineConfig, PipelineEvent, RetryPolicy, Stage,
    SummaryModel, Transcript, VidnexusError, pass_sizes,
};

/// Echoes the prompt body and can be told to fail on the n-th call (1-based).
#[derive(Default)]
struct ScriptedModel {
    prompts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
    transient: bool,
}

impl ScriptedModel {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<ModelOutput, ModelError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if self.fail_on == Some(call) {
            return Err(if self.transient {
                ModelError::Status {
                    status: 503,
                    body: "overloaded".into(),
                }
            } else {
                ModelError::Other("provider error".into())
            });
        }
        let body = prompt.split_once("\n\n").map(|(_, body)| body).unwrap_or(prompt);
        Ok(ModelOutput::Text(format!("{}\n", body)))
    }
}

type Events = Arc<Mutex<Vec<PipelineEvent>>>;

fn pipeline(model: &ScriptedModel, config: PipelineConfig) -> (Pipeline<&ScriptedModel>, Events) {
    let events: Events = Arc::default();
    let sink = Arc::clone(&events);
    let pipeline = Pipeline::new(model, config).with_reporter(Arc::new(move |event: &PipelineEvent| {
        sink.lock().unwrap().push(event.clone())
    }));
    (pipeline, events)
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::default().with_delay(Duration::ZERO)
}

fn completed_pass_sizes(events: &Events) -> Vec<usize> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::PassCompleted { size, .. } => Some(*size),
            _ => None,
        })
        .collect()
}

fn numbered_sentences(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Sentence {}.", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn three_sentences_merge_into_one_complete_summary() {
    let model = ScriptedModel::default();
    let (pipeline, events) = pipeline(&model, fast_config().with_max_words(1));

    let summary = pipeline.run(&Transcript::new("A. B. C.")).await.unwrap();

    assert_eq!(summary.as_str(), "A.\n\nB.\n\nC.");
    assert_eq!(completed_pass_sizes(&events), vec![3, 2, 1]);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 5);
    assert!(prompts[0].ends_with("\n\nA."));
    assert!(prompts[1].ends_with("\n\nB."));
    assert!(prompts[2].ends_with("\n\nC."));
    assert!(prompts[3].starts_with("Combine"));
}

#[tokio::test]
async fn empty_transcript_fails_without_model_calls() {
    let model = ScriptedModel::default();
    let (pipeline, events) = pipeline(&model, fast_config());

    for text in ["", "  \n\t  "] {
        let err = pipeline.run(&Transcript::new(text)).await.unwrap_err();
        assert!(matches!(err, VidnexusError::EmptyContent));
    }
    assert!(model.prompts().is_empty());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_call_failure_aborts_before_any_merge() {
    let model = ScriptedModel::failing_on(2);
    let (pipeline, _) = pipeline(&model, fast_config().with_max_words(1));

    let err = pipeline.run(&Transcript::new("A. B. C.")).await.unwrap_err();

    assert!(matches!(
        err,
        VidnexusError::ModelInvocation {
            stage: Stage::Leaf,
            index: 1,
            ..
        }
    ));
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().all(|p| !p.starts_with("Combine")));
}

#[tokio::test]
async fn ten_chunks_in_batches_of_three_take_four_passes() {
    let model = ScriptedModel::default();
    let (pipeline, events) = pipeline(&model, fast_config().with_max_words(2).with_batch_size(3));

    let summary = pipeline
        .run(&Transcript::new(numbered_sentences(10)))
        .await
        .unwrap();

    assert_eq!(completed_pass_sizes(&events), vec![10, 4, 2, 1]);
    assert_eq!(completed_pass_sizes(&events), pass_sizes(10, 3));
    assert_eq!(model.prompts().len(), 10 + 4 + 2 + 1);
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&PipelineEvent::Finished {
            passes: 4,
            model_calls: 17
        })
    );

    let positions: Vec<usize> = (1..=10)
        .map(|i| summary.as_str().find(&format!("Sentence {}.", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn chain_mode_takes_one_pass_per_merge() {
    let model = ScriptedModel::default();
    let (pipeline, events) = pipeline(&model, fast_config().with_max_words(2));

    pipeline
        .run(&Transcript::new(numbered_sentences(5)))
        .await
        .unwrap();

    assert_eq!(completed_pass_sizes(&events), vec![5, 4, 3, 2, 1]);
    assert_eq!(model.prompts().len(), 5 + 4);
}

#[tokio::test]
async fn single_chunk_needs_no_merge() {
    let model = ScriptedModel::default();
    let (pipeline, events) = pipeline(&model, fast_config());

    let summary = pipeline
        .run(&Transcript::new("Just one short sentence here."))
        .await
        .unwrap();

    assert_eq!(summary.as_str(), "Just one short sentence here.");
    assert_eq!(model.prompts().len(), 1);
    assert_eq!(completed_pass_sizes(&events), vec![1]);
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&PipelineEvent::Finished {
            passes: 1,
            model_calls: 1
        })
    );
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_any_call() {
    let model = ScriptedModel::default();

    for config in [fast_config().with_batch_size(0), fast_config().with_max_words(0)] {
        let (pipeline, _) = pipeline(&model, config);
        let err = pipeline.run(&Transcript::new("A. B.")).await.unwrap_err();
        assert!(matches!(err, VidnexusError::Configuration { .. }));
    }
    assert!(model.prompts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_model_call_is_followed_by_the_delay() {
    let model = ScriptedModel::default();
    let config = PipelineConfig::default()
        .with_max_words(1)
        .with_batch_size(2);
    let (pipeline, _) = pipeline(&model, config);

    let start = Instant::now();
    pipeline.run(&Transcript::new("A. B. C.")).await.unwrap();

    // 3 leaves, then 2 merges, then 1 merge
    assert_eq!(model.prompts().len(), 6);
    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn retry_policy_recovers_from_a_transient_failure() {
    let model = ScriptedModel {
        fail_on: Some(1),
        transient: true,
        ..ScriptedModel::default()
    };
    let config = fast_config()
        .with_max_words(1)
        .with_retry(RetryPolicy::default().with_max_retries(2));
    let (pipeline, _) = pipeline(&model, config);

    let summary = pipeline.run(&Transcript::new("A. B.")).await.unwrap();

    assert_eq!(summary.as_str(), "A.\n\nB.");
    assert_eq!(model.prompts().len(), 4);
}

#[tokio::test]
async fn independent_runs_share_nothing() {
    let model = ScriptedModel::default();
    let (pipeline, _) = pipeline(&model, fast_config().with_max_words(1).with_batch_size(2));

    let first = pipeline.run(&Transcript::new("A. B.")).await.unwrap();
    let second = pipeline.run(&Transcript::new("C. D.")).await.unwrap();

    assert_eq!(first.as_str(), "A.\n\nB.");
    assert_eq!(second.as_str(), "C.\n\nD.");
}

struct FixedSource(Option<&'static str>);

#[async_trait]
impl vidnexus_core::TranscriptSource for FixedSource {
    async fn fetch_transcript(&self, _identifier: &str) -> vidnexus_core::Result<Option<Transcript>> {
        Ok(self.0.map(Transcript::new))
    }
}

#[tokio::test]
async fn transcript_from_a_source_feeds_the_pipeline() {
    use vidnexus_core::TranscriptSource;

    let model = ScriptedModel::default();
    let (pipeline, _) = pipeline(&model, fast_config().with_max_words(1).with_batch_size(2));

    let missing = FixedSource(None).fetch_transcript("dQw4w9WgXcQ").await.unwrap();
    assert!(missing.is_none());

    let transcript = FixedSource(Some("First. Second."))
        .fetch_transcript("dQw4w9WgXcQ")
        .await
        .unwrap()
        .unwrap();
    let summary = pipeline.run(&transcript).await.unwrap();
    assert_eq!(summary.as_str(), "First.\n\nSecond.");
}
