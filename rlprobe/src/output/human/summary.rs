use std::fmt::Write as _;
use std::time::Duration;

use rlprobe_core::{ResultTally, RunConfig, TRANSPORT_FAILURE_STATUS};

use super::format::{format_duration, format_share};

pub(crate) fn render(config: &RunConfig, tally: &ResultTally, elapsed: Duration) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str("Done:\n");
    writeln!(
        &mut out,
        "    * initial number of requests configured: {}",
        config.total_attempts()
    )
    .ok();
    writeln!(
        &mut out,
        "    * total number of requests generated: {}",
        tally.total_completed
    )
    .ok();
    writeln!(&mut out, "    * elapsed: {}", format_duration(elapsed)).ok();
    out.push('\n');

    out.push_str("Response code frequencies:\n");
    if tally.counts.is_empty() {
        out.push_str("    (none)\n");
        return out;
    }

    for (status, count) in &tally.counts {
        let share = format_share(*count, tally.total_completed);
        if *status == TRANSPORT_FAILURE_STATUS {
            let kinds = tally
                .transport_failures
                .iter()
                .map(|(kind, n)| format!("{kind}={n}"))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(&mut out, "    transport_error: {count} ({share}) [{kinds}]").ok();
        } else {
            writeln!(&mut out, "    {status}: {count} ({share})").ok();
        }
    }

    out
}
