use std::io::Write;

use anyhow::Result;
use serde::{Serialize, Serializer};
use time::{format_description::well_known, OffsetDateTime};

use crate::types::{ProbeResult, ProbeStatus};

/// Marker used in place of an average when no attempt succeeded.
pub const NOT_AVAILABLE: &str = "N/A";

/// Top-level JSON document. Field order here is the output order.
#[derive(Serialize, Debug, Clone)]
pub struct Report {
    pub timestamp: String,
    pub summary: Summary,
}

#[derive(Serialize, Debug, Clone)]
pub struct Summary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub databases: Vec<DatabaseSummary>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DatabaseSummary {
    pub database: Option<String>,
    pub project: Option<String>,
    pub status: ProbeStatus,
    pub host: String,
    #[serde(serialize_with = "serialize_latency")]
    pub average_latency_ms: Option<f64>,
    pub attempts: u32,
}

impl Report {
    pub fn from_results(results: &[ProbeResult], generated_at: OffsetDateTime) -> Self {
        let databases: Vec<DatabaseSummary> = results
            .iter()
            .map(|r| DatabaseSummary {
                database: r.target.name.clone(),
                project: r.target.group.clone(),
                status: r.status,
                host: r.target.host.clone(),
                average_latency_ms: r.average_latency_ms,
                attempts: r.attempts_requested,
            })
            .collect();
        let successful_tests = results.iter().filter(|r| r.is_success()).count();

        Self {
            timestamp: format_timestamp(generated_at),
            summary: Summary {
                total_tests: databases.len(),
                successful_tests,
                failed_tests: databases.len() - successful_tests,
                databases,
            },
        }
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Build the report for `results`, write it to `out` and hand it back.
pub fn write_report<W: Write>(out: &mut W, results: &[ProbeResult]) -> Result<String> {
    let json = Report::from_results(results, OffsetDateTime::now_utc()).to_json()?;
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(json)
}

/// Milliseconds rounded to microsecond precision.
fn round_ms(ms: f64) -> f64 {
    (ms * 1_000.0).round() / 1_000.0
}

fn serialize_latency<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ms) => s.serialize_f64(round_ms(*ms)),
        None => s.serialize_str(NOT_AVAILABLE),
    }
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
