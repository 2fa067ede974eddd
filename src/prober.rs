use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use ::time::OffsetDateTime;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ProbeError;
use crate::types::{AttemptOutcome, ProbeResult, ProbeTarget};

pub const DEFAULT_ATTEMPTS: u32 = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);

/// A single timed connection attempt.
///
/// Implementations return how long the connect took, or why it failed.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<Duration, ProbeError>> + Send;
}

/// Opens a real TCP connection and closes it straight away.
///
/// Name resolution happens before the clock starts, so only the TCP
/// handshake is measured. Resolution and the connect share one `timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Duration, ProbeError> {
        let deadline = Instant::now() + timeout;
        let addrs: Vec<SocketAddr> = time::timeout_at(deadline, lookup_host((host, port)))
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|source| ProbeError::Resolve {
                host: host.to_string(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(ProbeError::NoAddress(host.to_string()));
        }
        connect_any(&addrs, deadline, timeout).await
    }
}

/// Try each address in turn until one accepts, like `TcpStream::connect`
/// does for a multi-address host.
///
/// Returns the handshake time of the connect that succeeded; time spent on
/// addresses that failed is not included. All attempts share `deadline`.
pub async fn connect_any(
    addrs: &[SocketAddr],
    deadline: Instant,
    timeout: Duration,
) -> Result<Duration, ProbeError> {
    let mut last_err = None;
    for addr in addrs {
        let start = Instant::now();
        match time::timeout_at(deadline, TcpStream::connect(*addr)).await {
            Ok(Ok(stream)) => {
                let elapsed = start.elapsed();
                drop(stream);
                return Ok(elapsed);
            }
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "address refused connect");
                last_err = Some(ProbeError::Connect(e));
            }
            Err(_) => return Err(ProbeError::Timeout(timeout)),
        }
    }
    Err(last_err.unwrap_or(ProbeError::Timeout(timeout)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Probe one target with `options.attempts` back-to-back connects.
///
/// - Failed attempts are recorded and never stop the loop.
/// - No retries, no pause between attempts.
/// - Returns `Err(ProbeError::Cancelled)` only if `cancel` fires before the
///   last attempt finishes; every other failure ends up in the result.
pub async fn probe_target<C: Connector>(
    connector: &C,
    target: &ProbeTarget,
    options: &ProbeOptions,
    cancel: &CancellationToken,
) -> Result<ProbeResult, ProbeError> {
    info!(
        host = %target.host,
        port = target.port,
        database = target.name.as_deref().unwrap_or("-"),
        attempts = options.attempts,
        "probing target"
    );

    let started_at = OffsetDateTime::now_utc();
    let mut outcomes = Vec::with_capacity(options.attempts as usize);

    for attempt in 1..=options.attempts {
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
            res = connector.connect(&target.host, target.port, options.timeout) => res,
        };
        match res {
            Ok(elapsed) => outcomes.push(AttemptOutcome::Latency(elapsed.as_secs_f64() * 1_000.0)),
            Err(e) => {
                debug!(host = %target.host, port = target.port, attempt, error = %e, "attempt failed");
                outcomes.push(AttemptOutcome::Failed);
            }
        }
    }

    let result =
        ProbeResult::from_outcomes(target.clone(), &outcomes, started_at, OffsetDateTime::now_utc());
    info!(
        host = %target.host,
        status = ?result.status,
        ok = result.successful_latencies.len(),
        failed = result.failed_attempts,
        avg_ms = result.average_latency_ms,
        "target done"
    );
    Ok(result)
}
