use std::collections::BTreeMap;
use std::process::Command;

use anyhow::Context as _;
use rlprobe_testserver::{TestServer, TestServerConfig};
use serde::Deserialize;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchLine {
    batch: u64,
    batches: u64,
    size: u64,
    status_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryLine {
    attempts_configured: u64,
    batch_size: u64,
    total_completed: u64,
    status_counts: BTreeMap<String, u64>,
    transport_failures: BTreeMap<String, u64>,
}

fn parse_ndjson(stdout: &str) -> anyhow::Result<(Vec<BatchLine>, SummaryLine)> {
    let mut batches = Vec::new();
    let mut summary = None;

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value =
            serde_json::from_str(line).with_context(|| format!("not json: {line}"))?;
        match value.get("kind").and_then(|k| k.as_str()) {
            Some("batch") => batches.push(serde_json::from_value(value)?),
            Some("summary") => summary = Some(serde_json::from_value(value)?),
            other => anyhow::bail!("unexpected line kind {other:?}: {line}"),
        }
    }

    let summary = summary.context("missing summary line")?;
    Ok((batches, summary))
}

async fn run_rlprobe(args: Vec<String>) -> anyhow::Result<std::process::Output> {
    let exe = env!("CARGO_BIN_EXE_rlprobe");
    tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args(&args)
            .env_remove("RLPROBE_URL")
            .env_remove("RLPROBE_ATTEMPTS")
            .env_remove("RLPROBE_BATCH_SIZE")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run rlprobe binary")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn json_run_reports_rate_limited_responses() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerConfig { rate_limit: 5 })
        .await
        .context("start test server")?;

    let out = run_rlprobe(vec![
        "-u".into(),
        server.urls().limited.clone(),
        "-a".into(),
        "20".into(),
        "-b".into(),
        "5".into(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(
        status_code(out.status) == 0,
        "expected exit code 0, got {}\nstdout:\n{stdout}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stderr)
    );

    let (batches, summary) = parse_ndjson(&stdout)?;

    assert_eq!(batches.len(), 4);
    for (i, line) in batches.iter().enumerate() {
        assert_eq!(line.batch, i as u64 + 1);
        assert_eq!(line.batches, 4);
        assert_eq!(line.size, 5);
        assert_eq!(line.status_counts.values().sum::<u64>(), 5);
    }

    assert_eq!(summary.attempts_configured, 20);
    assert_eq!(summary.batch_size, 5);
    assert_eq!(summary.total_completed, 20);
    assert_eq!(summary.status_counts.get("200"), Some(&5));
    assert_eq!(summary.status_counts.get("429"), Some(&15));
    assert!(summary.transport_failures.is_empty());
    assert_eq!(server.stats().limited_total(), 20);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn human_run_prints_frequency_table() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let out = run_rlprobe(vec![
        "-u".into(),
        server.urls().no_content.clone(),
        "-a".into(),
        "6".into(),
        "-b".into(),
        "3".into(),
    ])
    .await?;

    server.shutdown().await;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(status_code(out.status) == 0, "stdout:\n{stdout}");
    assert!(stdout.contains("number of requests to generate: 6"), "{stdout}");
    assert!(stdout.contains("Done:"), "{stdout}");
    assert!(
        stdout.contains("total number of requests generated: 6"),
        "{stdout}"
    );
    assert!(stdout.contains("Response code frequencies:"), "{stdout}");
    assert!(stdout.contains("204: 6 (100.0%)"), "{stdout}");
    assert!(stdout.contains("..."), "{stdout}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_file_supplies_run_settings() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("probe.yaml");
    std::fs::write(
        &path,
        format!(
            "url: {}\nattempts: 10\nbatchSize: 4\nallowPartialBatch: true\ntimeout: 2s\n",
            server.urls().ok
        ),
    )?;

    let out = run_rlprobe(vec![
        "--config".into(),
        path.display().to_string(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    server.shutdown().await;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(
        status_code(out.status) == 0,
        "stdout:\n{stdout}\nstderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let (batches, summary) = parse_ndjson(&stdout)?;
    let sizes: Vec<u64> = batches.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(summary.total_completed, 10);
    assert_eq!(summary.status_counts.get("200"), Some(&10));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_target_counts_transport_failures() -> anyhow::Result<()> {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };

    let out = run_rlprobe(vec![
        "-u".into(),
        format!("http://{addr}/"),
        "-a".into(),
        "4".into(),
        "-b".into(),
        "2".into(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(status_code(out.status) == 0, "stdout:\n{stdout}");

    let (_, summary) = parse_ndjson(&stdout)?;
    assert_eq!(summary.total_completed, 4);
    assert_eq!(summary.status_counts.get("0"), Some(&4));
    assert_eq!(summary.transport_failures.values().sum::<u64>(), 4);
    Ok(())
}
