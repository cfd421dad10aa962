//! TOML configuration for `orbitctl`.
//!
//! Every section is optional. Command-line flags override whatever the file
//! sets.

use std::path::{Path, PathBuf};

use orbit_ring::{DEFAULT_REPLICAS, HashAlgorithm};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ring parameters and the state file location.
    pub ring: RingSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[ring]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Virtual nodes per physical node for newly initialised rings.
    ///
    /// An existing state file keeps the replica count it was created with.
    pub replicas: u32,
    /// Hash strategy: `"murmur3"` (default) or `"blake3"`.
    ///
    /// Every consumer of a state file must use the same strategy or they
    /// will disagree on placement.
    pub hash: HashAlgorithm,
    /// Where the ring state is kept.
    pub state_file: PathBuf,
}

impl Default for RingSection {
    fn default() -> Self {
        let state_file = dirs::home_dir()
            .map(|h| h.join(".orbit").join("ring.json"))
            .unwrap_or_else(|| PathBuf::from("ring.json"));
        Self {
            replicas: DEFAULT_REPLICAS,
            hash: HashAlgorithm::default(),
            state_file,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
