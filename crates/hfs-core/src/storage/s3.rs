//! S3-compatible storage configuration
//!
//! Keys resolve to `s3a://{bucket}/{key}`, the scheme Hadoop-based engines use
//! for S3. The bucket defaults to `FEATURE_STORE_S3_BUCKET`.

use serde::{Deserialize, Serialize};

use super::{base_options, StorageConfig, StorageOptions, DEFAULT_FORMAT};
use crate::{Error, Result, SaveMode};

/// Environment variable holding the default bucket
pub const BUCKET_ENV: &str = "FEATURE_STORE_S3_BUCKET";

/// Datalake configuration on AWS S3
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name, without scheme
    pub bucket: String,

    /// Save mode for writes (default: overwrite)
    #[serde(default)]
    pub mode: SaveMode,

    /// Serialization format (default: parquet)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl S3Config {
    /// Creates a config for `bucket` with overwrite mode and parquet format
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            mode: SaveMode::default(),
            format: default_format(),
        }
    }

    /// Creates a config from `FEATURE_STORE_S3_BUCKET`
    ///
    /// # Errors
    ///
    /// `ConfigError` if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let bucket = std::env::var(BUCKET_ENV).unwrap_or_default();
        if bucket.trim().is_empty() {
            return Err(Error::config(format!("{} is not set", BUCKET_ENV)));
        }
        Ok(Self::new(bucket))
    }

    pub fn with_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl StorageConfig for S3Config {
    fn options(&self, key: &str) -> Result<StorageOptions> {
        let bucket = self.bucket.trim_matches('/');
        if bucket.is_empty() {
            return Err(Error::config("S3 bucket must not be empty"));
        }
        let path = format!("s3a://{}/{}", bucket, key.trim_start_matches('/'));
        Ok(base_options(path, &self.format, self.mode))
    }

    fn format(&self) -> &str {
        &self.format
    }

    fn mode(&self) -> SaveMode {
        self.mode
    }
}
