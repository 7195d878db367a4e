//! Engine trait
//!
//! This module defines the `Engine` trait, the abstraction that lets the writer
//! run on top of any large-scale tabular data engine. The writer never touches
//! data directly: it asks the engine to read, count and configure.
//!
//! ## Design Philosophy
//!
//! The trait only covers what the historical write/validate policy needs:
//! - Read the engine's runtime configuration
//! - Read persisted data back, either from storage or from a named table
//! - Build the schema-compatibility hook for a target table

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    DataFrame, OverwriteMode, PreWriteHook, Result, StorageOptions, PARTITION_OVERWRITE_MODE_KEY,
};

/// The core trait that all dataframe engines implement
///
/// All data-touching methods are async because they perform I/O (object
/// storage, metastore lookups). Implementations are expected to be cheap to
/// share behind a reference.
///
/// ## Example Implementation
///
/// ```rust,ignore
/// use hfs_core::{Engine, Result, StorageOptions};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl Engine for MyEngine {
///     type Frame = MyFrame;
///
///     async fn conf(&self, key: &str) -> Result<Option<String>> {
///         Ok(self.session.get(key))
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait Engine: Send + Sync {
    /// Dataframe type produced and consumed by this engine
    type Frame: DataFrame;

    /// Reads a runtime configuration value
    ///
    /// Returns `None` when the key is unset.
    async fn conf(&self, key: &str) -> Result<Option<String>>;

    /// Reads the partition overwrite mode as a typed value
    ///
    /// An unset key means the engine default, `static`.
    ///
    /// # Errors
    ///
    /// - `PartitionOverwriteMode` if the configured value is not a known mode
    async fn partition_overwrite_mode(&self) -> Result<OverwriteMode> {
        match self.conf(PARTITION_OVERWRITE_MODE_KEY).await? {
            Some(value) => value.parse(),
            None => Ok(OverwriteMode::Static),
        }
    }

    /// Reads persisted data with the given serialization format and options
    ///
    /// `options` must carry the physical `path`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if the engine cannot read `format`
    /// - `TableNotFound` if nothing exists at the path
    /// - `StorageError` if the underlying read fails
    async fn read(&self, format: &str, options: &StorageOptions) -> Result<Self::Frame>;

    /// Reads a metastore table or temporary view by name
    ///
    /// # Errors
    ///
    /// - `TableNotFound` if no table or view is registered under `name`
    async fn read_table(&self, name: &str) -> Result<Self::Frame>;

    /// Builds the hook that checks an incoming frame against an existing table
    ///
    /// The hook is created per write plan from the target table identity.
    fn schema_compatibility_hook(
        &self,
        table_name: &str,
        database: &str,
    ) -> Arc<dyn PreWriteHook<Self::Frame>>;
}
