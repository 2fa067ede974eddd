use std::collections::HashMap;

use crate::error::ConfigError;
use crate::types::ProbeTarget;

/// Highest configuration index scanned by default.
pub const DEFAULT_MAX_INDEX: u32 = 99;
/// PostgreSQL's well-known port.
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_PREFIX: &str = "CLOUDSQL";

/// Immutable copy of the configuration variables, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for `key`, trimmed. Blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub prefix: String,
    pub max_index: u32,
    pub default_port: u16,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            max_index: DEFAULT_MAX_INDEX,
            default_port: DEFAULT_PORT,
        }
    }
}

/// Build the probe targets described by indexed variables.
///
/// For each index `i` in `1..=max_index` the loader reads:
/// - `{PREFIX}_{i}_HOST`: required, indices without it are skipped
/// - `{PREFIX}_{i}_DBNAME` and `{PREFIX}_{i}_PROJECT`: optional
/// - `{PREFIX}_{i}_PORT`: optional override of the default port
///
/// Targets come back in ascending index order.
pub fn load_targets(
    env: &EnvSnapshot,
    config: &LoaderConfig,
) -> Result<Vec<ProbeTarget>, ConfigError> {
    let prefix = config.prefix.trim();
    if prefix.is_empty() {
        return Err(ConfigError::EmptyPrefix);
    }

    let mut out = Vec::new();
    for index in 1..=config.max_index {
        let key = |field: &str| format!("{prefix}_{index}_{field}");

        let Some(host) = env.get(&key("HOST")) else {
            continue;
        };
        let port = match env.get(&key("PORT")) {
            Some(raw) => parse_port(&key("PORT"), raw)?,
            None => config.default_port,
        };

        out.push(ProbeTarget {
            index,
            name: env.get(&key("DBNAME")).map(str::to_string),
            host: host.to_string(),
            port,
            group: env.get(&key("PROJECT")).map(str::to_string),
        });
    }

    Ok(out)
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    match raw.parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ConfigError::InvalidPort {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
