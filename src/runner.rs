use std::io::Write;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::{probe_all, ProbeRun};
use crate::prober::{Connector, ProbeOptions};
use crate::report::write_report;
use crate::types::ProbeTarget;

pub const NO_TARGETS_MESSAGE: &str = "No servers loaded. Please check your environment variables.";

#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing was configured, so nothing was probed.
    NoTargets,
    Reported { run: ProbeRun, report: String },
}

/// Probe `targets` and write the JSON report to `out`.
///
/// With no targets only [`NO_TARGETS_MESSAGE`] is written.
pub async fn run_and_report<C, W>(
    connector: C,
    targets: &[ProbeTarget],
    options: &ProbeOptions,
    concurrency: usize,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<RunOutcome>
where
    C: Connector + Clone + 'static,
    W: Write,
{
    if targets.is_empty() {
        writeln!(out, "{NO_TARGETS_MESSAGE}")?;
        return Ok(RunOutcome::NoTargets);
    }

    info!(
        targets = targets.len(),
        attempts = options.attempts,
        timeout_ms = options.timeout.as_millis() as u64,
        concurrency,
        "starting latency probe"
    );

    let run = probe_all(connector, targets, options, concurrency, cancel).await;
    if run.cancelled {
        warn!(
            completed = run.results.len(),
            total = targets.len(),
            "run cancelled, emitting partial report"
        );
    }

    let report = write_report(out, &run.results)?;
    Ok(RunOutcome::Reported { run, report })
}
