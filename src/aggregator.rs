use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::prober::{probe_target, Connector, ProbeOptions};
use crate::types::{ProbeResult, ProbeTarget};

/// Upper bound on targets probed at the same time.
pub const MAX_CONCURRENCY: usize = 256;

/// Results of a run over all targets, in input order.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub results: Vec<ProbeResult>,
    /// True if the run was cut short; `results` then only holds the targets
    /// that finished all their attempts.
    pub cancelled: bool,
}

/// Probe every target and collect one result per target.
///
/// With `concurrency <= 1` targets are probed strictly one after another.
/// Larger values probe up to that many targets at once; results are put
/// back into input order either way. A failed target never stops the run.
pub async fn probe_all<C>(
    connector: C,
    targets: &[ProbeTarget],
    options: &ProbeOptions,
    concurrency: usize,
    cancel: &CancellationToken,
) -> ProbeRun
where
    C: Connector + Clone + 'static,
{
    let results = if concurrency <= 1 || targets.len() <= 1 {
        probe_sequential(&connector, targets, options, cancel).await
    } else {
        probe_concurrent(connector, targets, options, concurrency, cancel).await
    };

    ProbeRun {
        cancelled: cancel.is_cancelled(),
        results,
    }
}

async fn probe_sequential<C: Connector>(
    connector: &C,
    targets: &[ProbeTarget],
    options: &ProbeOptions,
    cancel: &CancellationToken,
) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        if cancel.is_cancelled() {
            break;
        }
        match probe_target(connector, target, options, cancel).await {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(host = %target.host, error = %e, "probe interrupted");
                break;
            }
        }
    }
    results
}

async fn probe_concurrent<C>(
    connector: C,
    targets: &[ProbeTarget],
    options: &ProbeOptions,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<ProbeResult>
where
    C: Connector + Clone + 'static,
{
    let sem = Arc::new(Semaphore::new(concurrency.clamp(1, MAX_CONCURRENCY)));
    let mut set = JoinSet::new();

    for (pos, target) in targets.iter().cloned().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = sem.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
        };
        let connector = connector.clone();
        let options = options.clone();
        let cancel = cancel.clone();

        set.spawn(async move {
            let _permit = permit;
            let res = probe_target(&connector, &target, &options, &cancel).await;
            (pos, target.host, res)
        });
    }

    let mut finished = Vec::with_capacity(targets.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((pos, _, Ok(result))) => finished.push((pos, result)),
            Ok((_, host, Err(e))) => warn!(%host, error = %e, "probe interrupted"),
            // Same outcome as a panic on the sequential path.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => warn!(error = %e, "probe task failed"),
        }
    }

    finished.sort_by_key(|(pos, _)| *pos);
    finished.into_iter().map(|(_, result)| result).collect()
}
