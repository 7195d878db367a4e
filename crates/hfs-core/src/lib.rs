//! # Historical Feature Store Core
//!
//! Core types and traits shared by the historical writer and the engines it
//! runs on.
//!
//! ## Key Components
//!
//! - **Engine / DataFrame**: the abstraction over a columnar dataframe engine
//! - **StorageConfig**: maps logical storage keys to physical options
//! - **PreWriteHook**: checks run right before data is persisted
//! - **WritePlan**: the description of a write, produced by the writer
//! - **Errors**: strongly-typed error handling
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use hfs_core::prelude::*;
//!
//! async fn row_count<E: Engine>(engine: &E, table: &str) -> Result<u64> {
//!     engine.read_table(table).await?.count().await
//! }
//! ```

pub use engine::Engine;
pub use error::{Error, Result};
pub use frame::DataFrame;
pub use hook::PreWriteHook;
pub use plan::{WritePlan, DRY_RUN_TABLE_PREFIX};
pub use storage::{StorageConfig, StorageOptions};
pub use types::{
    ColumnExpr, DatePart, FeatureSet, OverwriteMode, SaveMode, WriteMode,
    PARTITION_DAY, PARTITION_MONTH, PARTITION_OVERWRITE_MODE_KEY, PARTITION_YEAR,
    TIMESTAMP_COLUMN,
};

pub mod config;
pub mod storage;

mod engine;
mod error;
mod frame;
mod hook;
mod plan;
mod types;

/// Commonly used imports: `use hfs_core::prelude::*`
pub mod prelude {
    pub use crate::engine::Engine;
    pub use crate::error::{Error, Result};
    pub use crate::frame::DataFrame;
    pub use crate::hook::PreWriteHook;
    pub use crate::plan::WritePlan;
    pub use crate::storage::{StorageConfig, StorageOptions};
    pub use crate::types::{ColumnExpr, FeatureSet, OverwriteMode, SaveMode, WriteMode};
}
