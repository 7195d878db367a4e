//! Storage configuration abstraction
//!
//! A [`StorageConfig`] maps a logical storage key (for example
//! `historical/user/user_features`) to the physical options an engine needs
//! to read or write it, and names the serialization format and save mode.
//!
//! ## Design Principle
//!
//! The writer only talks to the trait. Switching from S3 to a local directory
//! is a configuration change, not a code change:
//! - `S3Config`: `s3a://{bucket}/{key}`
//! - `LocalConfig`: `{base_path}/{key}`
//!
//! ## Example Usage
//!
//! ```rust
//! use hfs_core::storage::{S3Config, StorageConfig};
//!
//! let config = S3Config::new("my-feature-store");
//! let options = config.options("historical/user/user_features").unwrap();
//! assert_eq!(options["path"], "s3a://my-feature-store/historical/user/user_features");
//! ```

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::{Error, Result, SaveMode};

/// String options handed to an engine for one read or write
pub type StorageOptions = BTreeMap<String, String>;

/// Option key holding the resolved physical location
pub const PATH_OPTION: &str = "path";

/// Option key holding the save mode
pub const MODE_OPTION: &str = "mode";

/// Option key holding the serialization format
pub const FORMAT_OPTION: &str = "format";

/// Default serialization format for historical data
pub const DEFAULT_FORMAT: &str = "parquet";

/// Maps logical storage keys to physical engine options
pub trait StorageConfig: Debug + Send + Sync {
    /// Resolves the options for `key`
    ///
    /// The returned map always carries [`PATH_OPTION`].
    fn options(&self, key: &str) -> Result<StorageOptions>;

    /// Serialization format identifier (e.g. "parquet")
    fn format(&self) -> &str;

    /// Save mode used when writing
    fn mode(&self) -> SaveMode;
}

/// Extracts the resolved physical path from a set of options
///
/// # Errors
///
/// `ConfigError` if the options carry no `path`.
pub fn resolved_path(options: &StorageOptions) -> Result<&str> {
    options
        .get(PATH_OPTION)
        .map(String::as_str)
        .ok_or_else(|| Error::config("storage options do not contain a 'path'"))
}

pub(crate) fn base_options(path: String, format: &str, mode: SaveMode) -> StorageOptions {
    let mut options = StorageOptions::new();
    options.insert(PATH_OPTION.to_string(), path);
    options.insert(FORMAT_OPTION.to_string(), format.to_string());
    options.insert(MODE_OPTION.to_string(), mode.to_string());
    options
}

pub mod local;
pub mod s3;

pub use local::LocalConfig;
pub use s3::S3Config;
