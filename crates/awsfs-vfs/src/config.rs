//! Catalog configuration, loaded from a RON file.
//!
//! ```ron
//! (
//!     cache_ttl: Seconds(120),
//!     log: (
//!         filter: "awsfs=debug",
//!         log_dir: Some("/var/log/awsfs"),
//!     ),
//! )
//! ```
//!
//! Every field is optional.

use std::path::Path;

use awsfs_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::cache::Ttl;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Lifetime of cached listings built by providers.
    pub cache_ttl: Ttl,
    pub log: LogConfig,
}

impl CatalogConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
