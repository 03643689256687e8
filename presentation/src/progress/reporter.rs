//! Progress display driven by a run's event stream

use colored::Colorize;
use council_domain::{EventEnvelope, PipelineEvent, Stage, StageOutcome};
use futures::{Stream, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Something that renders pipeline events as they arrive
pub trait ProgressView: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Feed every event of `stream` to `view` until the stream ends.
///
/// Returns the last event seen, which is the terminal one when the run
/// finished normally.
pub async fn follow<S>(mut stream: S, view: &dyn ProgressView) -> Option<PipelineEvent>
where
    S: Stream<Item = EventEnvelope> + Unpin,
{
    let mut last = None;
    while let Some(envelope) = stream.next().await {
        view.on_event(&envelope.event);
        last = Some(envelope.event);
    }
    last
}

fn stage_label(stage: Stage) -> String {
    format!("Stage {}/3: {}", stage.index(), stage.display_name())
}

fn outcome_mark(outcome: StageOutcome) -> String {
    match outcome {
        StageOutcome::Success => "v".green().to_string(),
        StageOutcome::Timeout => "t".yellow().to_string(),
        StageOutcome::Error => "x".red().to_string(),
    }
}

/// One-line description of an event, `None` for events with nothing to show
pub fn describe(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Connected | PipelineEvent::PipelineComplete { .. } => None,
        PipelineEvent::AnalysisStart {
            pattern, policy, ..
        } => Some(format!("Analysis started ({} pattern, {} policy)", pattern, policy)),
        PipelineEvent::ModelSelected {
            models,
            ultra_model,
        } => Some(match ultra_model {
            Some(ultra) => format!("Models: {} (ultra: {})", models.join(", "), ultra),
            None => format!("Models: {}", models.join(", ")),
        }),
        PipelineEvent::StageStart { stage, models, .. } => Some(format!(
            "{} ({} models)",
            stage_label(*stage),
            models.len()
        )),
        PipelineEvent::ModelCompleted {
            model,
            status,
            latency_ms,
            ..
        } => Some(format!(
            "{} {} {} ({} ms)",
            outcome_mark(*status),
            model,
            status.as_str(),
            latency_ms
        )),
        PipelineEvent::StageComplete {
            stage,
            successes,
            requested,
            ..
        } => Some(format!(
            "{} done: {}/{} succeeded",
            stage_label(*stage),
            successes,
            requested
        )),
        PipelineEvent::ServiceUnavailable { code, message } => {
            Some(format!("Run failed [{}]: {}", code, message))
        }
    }
}

/// Reports progress with one progress bar per stage
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressView for ProgressReporter {
    fn on_event(&self, event: &PipelineEvent) {
        let mut stage_bar = self.stage_bar.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            PipelineEvent::StageStart { stage, models, .. } => {
                let pb = self.multi.add(ProgressBar::new(models.len() as u64));
                pb.set_style(Self::stage_style());
                pb.set_prefix(stage_label(*stage));
                pb.set_message("Starting...");
                *stage_bar = Some(pb);
            }
            PipelineEvent::ModelCompleted {
                model,
                status,
                latency_ms,
                ..
            } => {
                if let Some(pb) = stage_bar.as_ref() {
                    let mark = outcome_mark(*status);
                    pb.set_message(format!("{} {} ({} ms)", mark, model, latency_ms));
                    pb.inc(1);
                }
            }
            PipelineEvent::StageComplete {
                successes,
                requested,
                ..
            } => {
                if let Some(pb) = stage_bar.take() {
                    let summary = format!("{}/{} succeeded", successes, requested);
                    let summary = if successes == requested {
                        summary.green()
                    } else {
                        summary.yellow()
                    };
                    pb.finish_with_message(summary.to_string());
                }
            }
            PipelineEvent::ServiceUnavailable { .. } => {
                if let Some(pb) = stage_bar.take() {
                    pb.abandon();
                }
                if let Some(line) = describe(event) {
                    self.println(line.red().to_string());
                }
            }
            PipelineEvent::PipelineComplete { .. } => {
                if let Some(pb) = stage_bar.take() {
                    pb.finish();
                }
            }
            other => {
                if let Some(line) = describe(other) {
                    self.println(format!("{} {}", "->".cyan(), line));
                }
            }
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressView for SimpleProgress {
    fn on_event(&self, event: &PipelineEvent) {
        if let Some(line) = describe(event) {
            match event {
                PipelineEvent::ModelCompleted { .. } => eprintln!("  {}", line),
                _ => eprintln!("{} {}", "->".cyan(), line),
            }
        }
    }
}
