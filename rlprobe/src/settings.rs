use std::time::Duration;

use rlprobe_core::{BatchPolicy, RunConfig};

use crate::cli::Cli;
use crate::config_file::{ProbeFile, YamlDuration};
use crate::run_error::RunError;

pub(crate) const DEFAULT_BATCH_SIZE: u64 = 100;
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a run needs once flags and the config file have been merged.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub run: RunConfig,
    pub connect_timeout: Option<Duration>,
}

/// Flags win over the config file, which wins over built-in defaults.
pub(crate) fn resolve(cli: &Cli, file: Option<ProbeFile>) -> Result<Settings, RunError> {
    let file = file.unwrap_or_default();

    let url = cli
        .url
        .clone()
        .or(file.url)
        .ok_or_else(|| RunError::InvalidInput(anyhow::anyhow!("missing target url (--url)")))?;

    let attempts = cli.attempts.or(file.attempts).ok_or_else(|| {
        RunError::InvalidInput(anyhow::anyhow!("missing number of attempts (--attempts)"))
    })?;

    let batch_size = cli
        .batch_size
        .or(file.batch_size)
        .unwrap_or(DEFAULT_BATCH_SIZE);

    let policy = if cli.allow_partial_batch || file.allow_partial_batch.unwrap_or(false) {
        BatchPolicy::AllowPartial
    } else {
        BatchPolicy::Strict
    };

    let timeout = cli
        .timeout
        .or(file.timeout.map(YamlDuration::into_inner))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

    let connect_timeout = cli
        .connect_timeout
        .or(file.connect_timeout.map(YamlDuration::into_inner))
        .unwrap_or(rlprobe_core::DEFAULT_CONNECT_TIMEOUT);

    let run =
        RunConfig::new(url, attempts, batch_size, policy)?.with_request_timeout(Some(timeout));

    Ok(Settings {
        run,
        connect_timeout: (!connect_timeout.is_zero()).then_some(connect_timeout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;
    use clap::Parser as _;

    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("rlprobe").chain(args.iter().copied());
        match Cli::try_parse_from(argv) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    fn resolved(cli: &Cli, file: Option<ProbeFile>) -> Settings {
        resolve(cli, file).unwrap_or_else(|e| panic!("expected valid settings: {e}"))
    }

    #[test]
    fn defaults_apply_when_nothing_else_is_set() {
        let s = resolved(&cli(&["-u", "http://127.0.0.1/", "-a", "200"]), None);
        assert_eq!(s.run.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(s.run.policy(), BatchPolicy::Strict);
        assert_eq!(s.run.request_timeout(), Some(DEFAULT_REQUEST_TIMEOUT));
        assert_eq!(s.connect_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn flags_override_file_values() {
        let file = match ProbeFile::parse(
            "url: http://file.example/\nattempts: 40\nbatchSize: 5\ntimeout: 1s\n",
        ) {
            Ok(v) => v,
            Err(err) => panic!("expected valid yaml: {err:#}"),
        };

        let s = resolved(&cli(&["-a", "20", "--timeout", "250ms"]), Some(file));
        assert_eq!(s.run.url(), "http://file.example/");
        assert_eq!(s.run.total_attempts(), 20);
        assert_eq!(s.run.batch_size(), 5);
        assert_eq!(s.run.request_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn partial_batch_can_come_from_file() {
        let file = ProbeFile {
            allow_partial_batch: Some(true),
            ..ProbeFile::default()
        };
        let s = resolved(&cli(&["-u", "http://x.example/", "-a", "10", "-b", "4"]), Some(file));
        assert_eq!(s.run.policy(), BatchPolicy::AllowPartial);
        assert_eq!(s.run.batch_count(), 3);
    }

    #[test]
    fn zero_timeouts_disable_them() {
        let s = resolved(
            &cli(&[
                "-u",
                "http://x.example/",
                "-a",
                "1",
                "-b",
                "1",
                "--timeout",
                "0",
                "--connect-timeout",
                "0",
            ]),
            None,
        );
        assert_eq!(s.run.request_timeout(), None);
        assert_eq!(s.connect_timeout, None);
    }

    #[test]
    fn missing_url_is_invalid_input() {
        let err = match resolve(&cli(&["-a", "10"]), None) {
            Ok(s) => panic!("expected error, got {s:?}"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
    }

    #[test]
    fn non_factor_batch_is_invalid_input() {
        let err = match resolve(&cli(&["-u", "http://x.example/", "-a", "10", "-b", "6"]), None)
        {
            Ok(s) => panic!("expected error, got {s:?}"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
    }
}
