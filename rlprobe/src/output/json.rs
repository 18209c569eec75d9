use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rlprobe_core::{ProgressEvent, ProgressFn, ResultTally, RunConfig};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _config: &RunConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        let batch_counts: Arc<Mutex<BTreeMap<u16, u64>>> = Arc::new(Mutex::new(BTreeMap::new()));

        Some(Arc::new(move |event: ProgressEvent| {
            let mut counts = batch_counts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            match event {
                ProgressEvent::BatchStarted { .. } => counts.clear(),
                ProgressEvent::RequestCompleted { outcome } => {
                    *counts.entry(outcome.status()).or_insert(0) += 1;
                }
                ProgressEvent::BatchFinished {
                    batch,
                    batches,
                    size,
                    elapsed,
                } => {
                    let line = JsonBatchLine {
                        kind: "batch",
                        batch,
                        batches,
                        size,
                        elapsed_seconds: elapsed.as_secs_f64(),
                        status_counts: stringify_keys(&counts),
                    };
                    emit_json_line(&line);
                }
            }
        }))
    }

    fn print_summary(
        &self,
        config: &RunConfig,
        tally: &ResultTally,
        elapsed: Duration,
    ) -> anyhow::Result<()> {
        let line = build_summary_line(config, tally, elapsed);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonBatchLine {
    pub kind: &'static str,
    pub batch: u64,
    pub batches: u64,
    pub size: u64,
    pub elapsed_seconds: f64,
    pub status_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub url: String,
    pub attempts_configured: u64,
    pub batch_size: u64,
    pub total_completed: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub transport_failures: BTreeMap<String, u64>,
    pub elapsed_seconds: f64,
}

fn build_summary_line(config: &RunConfig, tally: &ResultTally, elapsed: Duration) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        url: config.url().to_string(),
        attempts_configured: config.total_attempts(),
        batch_size: config.batch_size(),
        total_completed: tally.total_completed,
        status_counts: stringify_keys(&tally.counts),
        transport_failures: tally
            .transport_failures
            .iter()
            .map(|(kind, n)| (kind.to_string(), *n))
            .collect(),
        elapsed_seconds: elapsed.as_secs_f64(),
    }
}

fn stringify_keys(counts: &BTreeMap<u16, u64>) -> BTreeMap<String, u64> {
    counts.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlprobe_core::{BatchPolicy, HttpTransportErrorKind, RequestOutcome, ResultAggregator};

    #[test]
    fn summary_line_uses_camel_case_and_string_keys() {
        let cfg = RunConfig::new("http://127.0.0.1:8080/", 3, 3, BatchPolicy::Strict)
            .unwrap_or_else(|e| panic!("expected valid config: {e}"));

        let agg = ResultAggregator::new();
        agg.report(RequestOutcome::response(200));
        agg.report(RequestOutcome::response(429));
        agg.report(RequestOutcome::transport_failure(
            HttpTransportErrorKind::Connect,
        ));

        let line = build_summary_line(&cfg, &agg.into_tally(), Duration::from_millis(500));
        let value = match serde_json::to_value(&line) {
            Ok(v) => v,
            Err(err) => panic!("serialize failed: {err}"),
        };

        assert_eq!(value["kind"], "summary");
        assert_eq!(value["attemptsConfigured"], 3);
        assert_eq!(value["totalCompleted"], 3);
        assert_eq!(value["statusCounts"]["200"], 1);
        assert_eq!(value["statusCounts"]["429"], 1);
        assert_eq!(value["statusCounts"]["0"], 1);
        assert_eq!(value["transportFailures"]["connect"], 1);
        assert_eq!(value["elapsedSeconds"], 0.5);
    }
}
