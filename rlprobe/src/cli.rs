use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Accepts humantime durations (`10s`, `250ms`, `1h`, `1m 30s`) and bare integer seconds.
pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        let secs: u64 = s
            .parse()
            .map_err(|_| format!("duration '{s}' is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m): {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress marks per batch and a human-readable summary.
    HumanReadable,
    /// Emit one JSON line per finished batch plus a summary line (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "rlprobe",
    author,
    version,
    about = "Burst an HTTP endpoint and tally the status codes that come back",
    long_about = "rlprobe tests the rate limiting of a web application (or the WAF in front of it).\n\nIt sends `--attempts` GET requests to `--url`, `--batch-size` at a time: every request of a batch is in flight at once, and the next batch starts only when the previous one has fully finished. The summary lists how often each response status code was seen.\n\nRequests that never get a response (refused, reset, timed out) are counted under status 0.",
    after_help = "Examples:\n  rlprobe -u https://example.com/login -a 200 -b 50\n  rlprobe -u http://127.0.0.1:8080/ -a 1000 --output json\n  rlprobe -u http://127.0.0.1:8080/ -a 10 -b 4 --allow-partial-batch\n  rlprobe --config probe.yaml --timeout 2s"
)]
pub struct Cli {
    /// Destination URL to be tested, must be HTTP or HTTPS
    #[arg(short = 'u', long, env = "RLPROBE_URL")]
    pub url: Option<String>,

    /// Total number of requests to be sent, must be evenly divisible by batch size
    #[arg(short = 'a', long, env = "RLPROBE_ATTEMPTS")]
    pub attempts: Option<u64>,

    /// Maximum concurrent requests [default: 100]. Must be less than or equal to attempts, and
    /// must be a factor of attempts unless --allow-partial-batch is set
    #[arg(short = 'b', long, env = "RLPROBE_BATCH_SIZE")]
    pub batch_size: Option<u64>,

    /// Let the last batch carry the remainder when batch size does not divide attempts
    #[arg(long)]
    pub allow_partial_batch: bool,

    /// Per-request timeout; a request running longer is counted as a transport failure
    /// (e.g. 10s, 500ms; 0 disables) [default: 10s]
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// TCP connect timeout (e.g. 3s; 0 disables) [default: 3s]
    #[arg(long, value_parser = parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// YAML file providing any of the options above; flags take precedence over it
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
