#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use db_latency_probe::error::ProbeError;
use db_latency_probe::prober::Connector;
use db_latency_probe::types::ProbeTarget;

/// What the fake connector does for a given host.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Succeed with these latencies (ms), cycling if attempts exceed them.
    Latencies(Vec<f64>),
    /// Sleep, then succeed with the given latency.
    Delayed(Duration, f64),
    Refuse,
    /// Never complete; only cancellation ends the attempt.
    Hang,
    Panic,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    plans: Arc<HashMap<String, Plan>>,
    cursors: Arc<Mutex<HashMap<String, usize>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new<I: IntoIterator<Item = (&'static str, Plan)>>(plans: I) -> Self {
        Self {
            plans: Arc::new(plans.into_iter().map(|(h, p)| (h.to_string(), p)).collect()),
            ..Self::default()
        }
    }

    /// Hosts in the order connect was called.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_latency(&self, host: &str, latencies: &[f64]) -> f64 {
        let mut cursors = self.cursors.lock().unwrap();
        let i = cursors.entry(host.to_string()).or_insert(0);
        let ms = latencies[*i % latencies.len()];
        *i += 1;
        ms
    }
}

impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        host: &str,
        _port: u16,
        _timeout: Duration,
    ) -> Result<Duration, ProbeError> {
        self.calls.lock().unwrap().push(host.to_string());
        match self.plans.get(host).cloned().unwrap_or(Plan::Refuse) {
            Plan::Latencies(l) => Ok(Duration::from_secs_f64(self.next_latency(host, &l) / 1_000.0)),
            Plan::Delayed(wait, ms) => {
                tokio::time::sleep(wait).await;
                Ok(Duration::from_secs_f64(ms / 1_000.0))
            }
            Plan::Refuse => Err(ProbeError::Connect(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            ))),
            Plan::Hang => std::future::pending().await,
            Plan::Panic => panic!("connector blew up on {host}"),
        }
    }
}

pub fn target(index: u32, name: &str, host: &str, project: &str) -> ProbeTarget {
    ProbeTarget {
        index,
        name: Some(name.to_string()),
        host: host.to_string(),
        port: 5432,
        group: Some(project.to_string()),
    }
}
