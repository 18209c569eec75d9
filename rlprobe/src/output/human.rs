use std::sync::Arc;
use std::time::Duration;

use rlprobe_core::{ProgressEvent, ProgressFn, ResultTally, RunConfig};

mod format;
mod progress;
mod summary;

use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &RunConfig) {
        println!();
        println!("Note: '.' = 200/204 response, and '!' = all other response codes.");
        println!();
        println!("number of requests to generate: {}", config.total_attempts());
        println!("target: {}", config.url());
        println!(
            "batches: {} (batch size {}, policy {})",
            config.batch_count(),
            config.batch_size(),
            config.policy()
        );
        println!();

        self.progress.set_total(config.total_attempts());
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |event: ProgressEvent| match event {
            ProgressEvent::BatchStarted {
                batch,
                batches,
                size,
            } => progress.batch_started(batch, batches, size),
            ProgressEvent::RequestCompleted { outcome } => {
                progress.request_completed(outcome.progress_mark());
            }
            ProgressEvent::BatchFinished { .. } => progress.batch_finished(),
        }))
    }

    fn abandon(&self) {
        self.progress.finish();
    }

    fn print_summary(
        &self,
        config: &RunConfig,
        tally: &ResultTally,
        elapsed: Duration,
    ) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(config, tally, elapsed));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlprobe_core::RequestOutcome;

    #[test]
    fn abandon_clears_a_live_bar() {
        let out = HumanReadableOutput::new();
        let Some(progress) = out.progress() else {
            panic!("human output should report progress");
        };

        progress(ProgressEvent::BatchStarted {
            batch: 1,
            batches: 2,
            size: 2,
        });
        progress(ProgressEvent::RequestCompleted {
            outcome: RequestOutcome::response(200),
        });
        assert!(out.progress.is_drawing());

        out.abandon();
        assert!(!out.progress.is_drawing());
    }
}
