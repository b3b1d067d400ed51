//! Deployment configuration, loaded from an optional TOML file with an
//! in-code default — mirroring the node-config pattern the rest of the
//! lineage uses, but scoped to what the core engine itself needs.

use serde::{Deserialize, Serialize};

/// Configuration for a single ledger deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Root directory holding `blocks/` (content-store blobs) and `data/`
    /// (head pointer + pins datastore).
    pub root: String,
    /// Clock value (ms) a freshly constructed ledger seeds its simulated
    /// clock with, before any `advance_time`/`set_time` call.
    pub genesis_time_ms: i64,
    /// Tag identifying the content-address hash scheme in use, so two
    /// deployments sharing a store can confirm they canonicalize identically.
    pub hash_scheme: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            root: "./omnium-data".to_string(),
            genesis_time_ms: 0,
            hash_scheme: "blake3-256".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load from a TOML file at `path`, falling back to defaults (with a
    /// tracing warning) if the file is absent or malformed.
    pub fn load_or_default(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<LedgerConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path, error = %e, "failed to parse ledger config, using defaults");
                    LedgerConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(path, "no ledger config file, using defaults");
                LedgerConfig::default()
            }
        }
    }

    pub fn blocks_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.root).join("blocks")
    }

    pub fn data_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.root).join("data")
    }
}
