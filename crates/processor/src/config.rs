//! Processor configuration via `txfilter.toml`
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working processor. Settings are read once at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use txfilter_core::{Error, Result};

/// Config file name placed next to the region data.
pub const CONFIG_FILE_NAME: &str = "txfilter.toml";

/// What flush and compaction do before any snapshot has been published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColdCachePolicy {
    /// Run the operation unfiltered (the store's default behavior)
    #[default]
    FailOpen,
    /// Refuse the operation; the host retries once the cache is warm
    Reject,
}

/// Transaction processor configuration loaded from `txfilter.toml`.
///
/// # Example
///
/// ```toml
/// cold_cache_policy = "fail_open"
/// snapshot_refresh_interval_ms = 15000
/// log_delete_rewrites = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Behavior of flush/compaction on a cold snapshot cache
    #[serde(default)]
    pub cold_cache_policy: ColdCachePolicy,
    /// How often the refresher polls for a new snapshot
    #[serde(default = "default_refresh_interval_ms")]
    pub snapshot_refresh_interval_ms: u64,
    /// Log every logical delete rewritten into delete markers
    #[serde(default = "default_log_delete_rewrites")]
    pub log_delete_rewrites: bool,
}

fn default_refresh_interval_ms() -> u64 {
    15_000
}

fn default_log_delete_rewrites() -> bool {
    true
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cold_cache_policy: ColdCachePolicy::default(),
            snapshot_refresh_interval_ms: default_refresh_interval_ms(),
            log_delete_rewrites: default_log_delete_rewrites(),
        }
    }
}

impl ProcessorConfig {
    /// Snapshot refresh interval as a `Duration`
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_refresh_interval_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# txfilter transaction processor configuration
#
# Flush/compaction behavior before the first snapshot is published:
#   "fail_open" = run unfiltered (default)
#   "reject"    = refuse the operation until a snapshot is available
cold_cache_policy = "fail_open"

# Snapshot refresh interval in milliseconds (default: 15000)
snapshot_refresh_interval_ms = 15000

# Log logical deletes as they are rewritten into delete markers (default: true)
log_delete_rewrites = true
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text is not a valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProcessorConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        if config.snapshot_refresh_interval_ms == 0 {
            return Err(Error::Config(
                "snapshot_refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}
