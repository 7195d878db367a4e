//! # Arrow Engine
//!
//! A local, single-process [`Engine`](hfs_core::Engine) built on Apache Arrow
//! and Parquet. Data lives in memory as [`ArrowFrame`]s and is persisted as
//! Hive-partitioned Parquet on the local filesystem.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use hfs_arrow::{ArrowFrame, LocalEngine};
//! use hfs_core::PARTITION_OVERWRITE_MODE_KEY;
//! use hfs_writer::HistoricalWriter;
//!
//! let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
//! let writer = HistoricalWriter::builder(storage, "feature_store").build()?;
//!
//! let plan = writer.prepare_for_write(&feature_set, frame.clone(), &engine).await?;
//! engine.commit(plan).await?;
//! writer.validate(&feature_set, &frame, &engine).await?;
//! ```

pub use engine::{CommitSummary, LocalEngine, TableEntry};
pub use frame::ArrowFrame;
pub use hook::SchemaCompatibilityHook;
pub use parquet_io::CompressionCodec;
pub use partition::{hash_repartition, split_by_values, HIVE_DEFAULT_PARTITION};

mod date_part;
mod engine;
mod frame;
mod hook;
mod parquet_io;
mod partition;
