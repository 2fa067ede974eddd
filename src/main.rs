use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use db_latency_probe::cli::Cli;
use db_latency_probe::prober::TcpConnector;
use db_latency_probe::runner::{self, RunOutcome};
use db_latency_probe::targets::{self, EnvSnapshot};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env file is fine; the process environment still applies.
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let env = EnvSnapshot::from_process();
    let targets = targets::load_targets(&env, &cli.loader_config())
        .context("failed to load probe targets")?;

    // Ctrl-C stops further attempts; completed targets are still reported.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping probes");
            cancel_ctrlc.cancel();
        }
    });

    let outcome = runner::run_and_report(
        TcpConnector,
        &targets,
        &cli.probe_options(),
        cli.concurrency,
        &cancel,
        &mut std::io::stdout(),
    )
    .await
    .context("failed to render report")?;

    let RunOutcome::Reported { run, .. } = outcome else {
        return Ok(ExitCode::SUCCESS);
    };
    if cli.exit_code.should_fail(&run.results) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("db_latency_probe=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
