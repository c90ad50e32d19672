//! Engine configuration
//!
//! Loaded from a JSON document; every field is optional and falls back to
//! its default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for a `FlowEngine`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spread all-pairs max flow over the rayon thread pool
    pub parallel_all_pairs: bool,
    /// Seed for random rail failure sampling
    pub failure_seed: u64,
    /// Truncate rankings to this many rows when reporting
    pub report_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_all_pairs: true,
            failure_seed: 42,
            report_limit: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        debug!("Loaded engine config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
