use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use rlprobe_core::{BatchRunner, HttpClient, HttpTransport};

use crate::cli::Cli;
use crate::config_file::ProbeFile;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;
use crate::settings;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let file = match &cli.config {
        Some(path) => Some(ProbeFile::load(path).await.map_err(RunError::InvalidInput)?),
        None => None,
    };
    let settings = settings::resolve(&cli, file)?;
    let config = &settings.run;

    tracing::debug!(
        request_timeout = ?config.request_timeout(),
        connect_timeout = ?settings.connect_timeout,
        "settings resolved"
    );

    let out = output::formatter(cli.output);

    let client = HttpClient::new(settings.connect_timeout);
    let mut runner = BatchRunner::new(Arc::new(HttpTransport::new(client)));
    if let Some(progress) = out.progress() {
        runner = runner.with_progress(progress);
    }

    out.print_header(config);

    let started = Instant::now();
    let tally = match runner.run(config).await {
        Ok(tally) => tally,
        Err(err) => {
            out.abandon();
            return Err(err.into());
        }
    };
    let elapsed = started.elapsed();

    out.print_summary(config, &tally, elapsed)
        .context("failed to print summary")
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}
