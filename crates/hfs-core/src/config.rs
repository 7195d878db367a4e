//! Writer configuration
//!
//! Configuration can come from:
//! - YAML files (hfs.yaml)
//! - Environment variables (FEATURE_STORE_*)
//!
//! ## Example Configuration File (hfs.yaml)
//!
//! ```yaml
//! database: feature_store
//! num_partitions: 200
//! validation_threshold: 0.01
//! debug_mode: false
//! storage:
//!   type: s3
//!   bucket: my-feature-store
//!   mode: overwrite
//!   format: parquet
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::storage::{LocalConfig, S3Config, StorageConfig};
use crate::{Error, Result, WriteMode};

/// Environment variable holding the historical database name
pub const DATABASE_ENV: &str = "FEATURE_STORE_HISTORICAL_DATABASE";

/// Environment variable overriding the repartition target
pub const NUM_PARTITIONS_ENV: &str = "FEATURE_STORE_NUM_PARTITIONS";

/// Environment variable selecting local storage when no bucket is configured
pub const LOCAL_PATH_ENV: &str = "FEATURE_STORE_LOCAL_PATH";

/// Number of partitions the dataframe is redistributed into before writing
pub const DEFAULT_NUM_PARTITIONS: usize = 200;

/// Relative tolerance of the post-write count validation
pub const DEFAULT_VALIDATION_THRESHOLD: f64 = 0.01;

/// Complete configuration of a historical writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Metastore database of the historical tables
    pub database: String,

    /// Repartition target before writing (default: 200, also used for 0)
    #[serde(default = "default_num_partitions")]
    pub num_partitions: usize,

    /// Count validation tolerance in [0, 1] (default: 0.01)
    #[serde(default = "default_validation_threshold")]
    pub validation_threshold: f64,

    /// Write to a temporary view instead of the real table
    #[serde(default)]
    pub debug_mode: bool,

    /// Where the data lives
    pub storage: StorageSettings,
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageSettings {
    S3(S3Config),
    Local(LocalConfig),
}

impl StorageSettings {
    /// Builds the storage configuration object the writer owns
    pub fn build(&self) -> Arc<dyn StorageConfig> {
        match self {
            StorageSettings::S3(config) => Arc::new(config.clone()),
            StorageSettings::Local(config) => Arc::new(config.clone()),
        }
    }
}

fn default_num_partitions() -> usize {
    DEFAULT_NUM_PARTITIONS
}

fn default_validation_threshold() -> f64 {
    DEFAULT_VALIDATION_THRESHOLD
}

fn num_partitions_from_env() -> Result<usize> {
    match std::env::var(NUM_PARTITIONS_ENV) {
        Ok(raw) => raw.trim().parse::<usize>().map_err(|e| {
            Error::config(format!("{}='{}' is not a number: {}", NUM_PARTITIONS_ENV, raw, e))
        }),
        Err(_) => Ok(DEFAULT_NUM_PARTITIONS),
    }
}

impl WriterConfig {
    /// Builds a configuration from `FEATURE_STORE_*` environment variables
    ///
    /// # Errors
    ///
    /// `ConfigError` if the database is unset, the partition count does not
    /// parse, or neither a bucket nor a local path is configured.
    pub fn from_env() -> Result<Self> {
        let database = std::env::var(DATABASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config(format!("{} is not set", DATABASE_ENV)))?;

        let storage = match S3Config::from_env() {
            Ok(s3) => StorageSettings::S3(s3),
            Err(_) => match std::env::var(LOCAL_PATH_ENV) {
                Ok(path) if !path.trim().is_empty() => {
                    StorageSettings::Local(LocalConfig::new(PathBuf::from(path)))
                }
                _ => {
                    return Err(Error::config(format!(
                        "neither {} nor {} is set",
                        crate::storage::s3::BUCKET_ENV,
                        LOCAL_PATH_ENV
                    )))
                }
            },
        };

        Self::with_storage(database, storage)
    }

    /// Configuration writing under a local `base_path`
    ///
    /// The partition count still honours `FEATURE_STORE_NUM_PARTITIONS`.
    pub fn local(database: impl Into<String>, base_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_storage(
            database.into(),
            StorageSettings::Local(LocalConfig::new(base_path.into())),
        )
    }

    fn with_storage(database: String, storage: StorageSettings) -> Result<Self> {
        let config = Self {
            database,
            num_partitions: num_partitions_from_env()?,
            validation_threshold: DEFAULT_VALIDATION_THRESHOLD,
            debug_mode: false,
            storage,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the writer relies on
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(Error::config("database must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.validation_threshold) {
            return Err(Error::config(format!(
                "validation_threshold must be within [0, 1], got {}",
                self.validation_threshold
            )));
        }
        Ok(())
    }

    pub fn write_mode(&self) -> WriteMode {
        WriteMode::from_debug_flag(self.debug_mode)
    }
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, the configuration is built from the environment
/// instead.
///
/// # Example
///
/// ```rust,ignore
/// let config = hfs_core::config::load("hfs.yaml")?;
/// println!("Writing into database {}", config.database);
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<WriterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        tracing::warn!(
            "Configuration file '{}' not found, using environment",
            path.display()
        );
        return WriterConfig::from_env();
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read '{}': {}", path.display(), e))
    })?;

    let config: WriterConfig = serde_yaml::from_str(&contents).map_err(|e| {
        Error::config(format!("failed to parse '{}': {}", path.display(), e))
    })?;
    config.validate()?;

    tracing::info!("Loaded configuration from {}", path.display());

    Ok(config)
}
