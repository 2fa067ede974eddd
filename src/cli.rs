use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::prober::{ProbeOptions, DEFAULT_ATTEMPTS, DEFAULT_TIMEOUT_MS};
use crate::targets::{LoaderConfig, DEFAULT_MAX_INDEX, DEFAULT_PORT, DEFAULT_PREFIX};
use crate::types::ProbeResult;

/// db-latency-probe: measure raw TCP connect latency to configured database hosts.
///
/// Targets come from `{PREFIX}_{N}_HOST`, `{PREFIX}_{N}_DBNAME`,
/// `{PREFIX}_{N}_PROJECT` and optionally `{PREFIX}_{N}_PORT`.
#[derive(Debug, Clone, Parser)]
#[command(name = "db-latency-probe", version, about, long_about = None)]
pub struct Cli {
    /// Prefix of the indexed target variables.
    #[arg(long, env = "PROBE_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Highest target index to look for.
    #[arg(long = "max-index", env = "PROBE_MAX_INDEX", default_value_t = DEFAULT_MAX_INDEX)]
    pub max_index: u32,

    /// Port used when an entry has no `_PORT` variable.
    #[arg(long, env = "PROBE_DEFAULT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connect attempts per target.
    #[arg(
        long,
        env = "PROBE_ATTEMPTS",
        default_value_t = DEFAULT_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub attempts: u32,

    /// Per-attempt timeout in milliseconds.
    #[arg(
        long = "timeout-ms",
        env = "PROBE_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_ms: u64,

    /// Targets probed at the same time (1 = sequential).
    #[arg(long, env = "PROBE_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// When to exit non-zero based on probe outcomes.
    #[arg(long = "exit-code", env = "PROBE_EXIT_CODE", value_enum, default_value_t = ExitPolicy::Never)]
    pub exit_code: ExitPolicy,
}

impl Cli {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            prefix: self.prefix.clone(),
            max_index: self.max_index,
            default_port: self.port,
        }
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            attempts: self.attempts,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExitPolicy {
    /// Always exit 0 once the report is printed.
    Never,
    /// Exit 1 when every probed target failed.
    AllFailed,
    /// Exit 1 when at least one target failed.
    AnyFailed,
}

impl ExitPolicy {
    pub fn should_fail(self, results: &[ProbeResult]) -> bool {
        match self {
            ExitPolicy::Never => false,
            ExitPolicy::AllFailed => {
                !results.is_empty() && results.iter().all(|r| !r.is_success())
            }
            ExitPolicy::AnyFailed => results.iter().any(|r| !r.is_success()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttemptOutcome, ProbeTarget};
    use time::OffsetDateTime;

    fn result(ok: bool) -> ProbeResult {
        let target = ProbeTarget {
            index: 1,
            name: None,
            host: "db".into(),
            port: 5432,
            group: None,
        };
        let outcome = if ok {
            AttemptOutcome::Latency(1.0)
        } else {
            AttemptOutcome::Failed
        };
        let now = OffsetDateTime::UNIX_EPOCH;
        ProbeResult::from_outcomes(target, &[outcome], now, now)
    }

    #[test]
    fn defaults_match_baseline() {
        let cli = Cli::try_parse_from(["db-latency-probe"]).unwrap();
        assert_eq!(cli.loader_config(), LoaderConfig::default());
        assert_eq!(cli.probe_options(), ProbeOptions::default());
        assert_eq!(cli.concurrency, 1);
        assert_eq!(cli.exit_code, ExitPolicy::Never);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "db-latency-probe",
            "--prefix",
            "PG",
            "--attempts",
            "3",
            "--timeout-ms",
            "250",
            "--exit-code",
            "all-failed",
        ])
        .unwrap();
        assert_eq!(cli.loader_config().prefix, "PG");
        assert_eq!(cli.probe_options().attempts, 3);
        assert_eq!(cli.probe_options().timeout, Duration::from_millis(250));
        assert_eq!(cli.exit_code, ExitPolicy::AllFailed);
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = Cli::try_parse_from(["db-latency-probe", "--attempts", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = Cli::try_parse_from(["db-latency-probe", "--timeout-ms", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn exit_policies() {
        let mixed = [result(true), result(false)];
        let failed = [result(false), result(false)];

        assert!(!ExitPolicy::Never.should_fail(&failed));
        assert!(!ExitPolicy::AllFailed.should_fail(&mixed));
        assert!(ExitPolicy::AllFailed.should_fail(&failed));
        assert!(!ExitPolicy::AllFailed.should_fail(&[]));
        assert!(ExitPolicy::AnyFailed.should_fail(&mixed));
    }
}
