use std::time::Duration;

use rlprobe_core::{ProgressFn, ResultTally, RunConfig};

use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &RunConfig);
    fn progress(&self) -> Option<ProgressFn>;
    /// Tears down any live progress display; called when a run ends without a summary.
    fn abandon(&self) {}
    fn print_summary(
        &self,
        config: &RunConfig,
        tally: &ResultTally,
        elapsed: Duration,
    ) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
