//! # Configuration
//!
//! Store configuration is managed by [`confique`], which handles layered
//! loading from a TOML file and environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `ZKBIN_DATA_DIR`, `ZKBIN_PURGE_BATCH_SIZE`,
//!    `ZKBIN_PURGE_LIMIT`.
//! 2. **Config file**: the TOML file given to [`StoreConfig::load`], if any.
//!    A missing file is skipped.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `dir` | `data` | Storage root |
//! | `purge_batch_size` | `10` | Expired pastes deleted per purge pass |
//! | `purge_limit_secs` | `300` | Minimum seconds between opportunistic purges |

use crate::error::{Result, ZkbinError};
use crate::store::DEFAULT_PURGE_BATCH_SIZE;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the paste store, stored in `zkbin.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding pastes, comments and namespace values.
    #[config(default = "data", env = "ZKBIN_DATA_DIR")]
    pub dir: PathBuf,

    /// Number of expired pastes deleted per purge pass.
    #[config(default = 10, env = "ZKBIN_PURGE_BATCH_SIZE")]
    pub purge_batch_size: usize,

    /// Minimum number of seconds between two opportunistic purges.
    /// Zero purges on every call.
    #[config(default = 300, env = "ZKBIN_PURGE_LIMIT")]
    pub purge_limit_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            purge_batch_size: DEFAULT_PURGE_BATCH_SIZE,
            purge_limit_secs: 300,
        }
    }
}

impl StoreConfig {
    /// Load from the environment and an optional TOML file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        builder.load().map_err(|e| ZkbinError::Config(e.to_string()))
    }
}
