//! Local filesystem storage configuration
//!
//! Keys resolve to paths under a base directory. Useful for development, tests
//! and single-node deployments.
//!
//! ## Directory Structure
//!
//! ```text
//! /data/feature_store/
//!   └─ historical/
//!       └─ user/
//!           └─ user_features/
//!               └─ year=2024/month=3/day=14/part-00000-....parquet
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{base_options, StorageConfig, StorageOptions, DEFAULT_FORMAT};
use crate::{Result, SaveMode};

/// Storage rooted at a local directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Base directory for all historical data
    pub base_path: PathBuf,

    #[serde(default)]
    pub mode: SaveMode,

    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl LocalConfig {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            mode: SaveMode::default(),
            format: default_format(),
        }
    }

    pub fn with_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }
}

impl StorageConfig for LocalConfig {
    fn options(&self, key: &str) -> Result<StorageOptions> {
        let path = self.base_path.join(key.trim_start_matches('/'));
        Ok(base_options(
            path.to_string_lossy().into_owned(),
            &self.format,
            self.mode,
        ))
    }

    fn format(&self) -> &str {
        &self.format
    }

    fn mode(&self) -> SaveMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PATH_OPTION;

    #[test]
    fn test_options_resolve_under_base_path() {
        let config = LocalConfig::new("/data/feature_store");
        let options = config.options("historical/user/user_features").unwrap();
        assert_eq!(
            PathBuf::from(&options[PATH_OPTION]),
            PathBuf::from("/data/feature_store/historical/user/user_features")
        );
        assert_eq!(config.format(), "parquet");
        assert_eq!(config.mode(), SaveMode::Overwrite);
    }
}
