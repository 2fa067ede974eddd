use serde::Serialize;
use time::OffsetDateTime;

/// One database endpoint to probe, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Configuration index the entry was read from.
    pub index: u32,
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    /// Logical grouping, e.g. the cloud project owning the database.
    pub group: Option<String>,
}

/// Result of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptOutcome {
    /// Connect time in milliseconds.
    Latency(f64),
    Failed,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Error,
}

/// Outcome of probing one target `attempts_requested` times.
///
/// Build it with [`ProbeResult::from_outcomes`], which derives the status,
/// latencies and average from the attempts so they agree with each other.
/// The fields are public for reading; mutating them can break that agreement.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub target: ProbeTarget,
    pub status: ProbeStatus,
    pub successful_latencies: Vec<f64>,
    pub average_latency_ms: Option<f64>,
    pub attempts_requested: u32,
    pub failed_attempts: u32,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
}

impl ProbeResult {
    pub fn from_outcomes(
        target: ProbeTarget,
        outcomes: &[AttemptOutcome],
        started_at: OffsetDateTime,
        finished_at: OffsetDateTime,
    ) -> Self {
        let successful_latencies: Vec<f64> = outcomes
            .iter()
            .filter_map(|o| match o {
                AttemptOutcome::Latency(ms) => Some(*ms),
                AttemptOutcome::Failed => None,
            })
            .collect();
        let failed_attempts = (outcomes.len() - successful_latencies.len()) as u32;
        let average_latency_ms = mean(&successful_latencies);
        let status = if successful_latencies.is_empty() {
            ProbeStatus::Error
        } else {
            ProbeStatus::Success
        };

        Self {
            target,
            status,
            successful_latencies,
            average_latency_ms,
            attempts_requested: outcomes.len() as u32,
            failed_attempts,
            started_at,
            finished_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
