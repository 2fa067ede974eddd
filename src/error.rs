use std::time::Duration;

use thiserror::Error;

/// Problems with the configuration that make a meaningful report impossible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("variable prefix must not be empty")]
    EmptyPrefix,
    #[error("invalid port in {key}: {value:?} (expected 1-65535)")]
    InvalidPort { key: String, value: String },
}

/// Why a single connection attempt (or a whole probe) did not produce a latency.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} resolved to no addresses")]
    NoAddress(String),
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),
    #[error("probe cancelled")]
    Cancelled,
}
