//! # Historical Feature Store Writer
//!
//! Persists computed feature sets into a partitioned historical store (object
//! storage plus a metastore table) through any [`hfs_core::Engine`].
//!
//! The writer owns three policies:
//! - **Partition derivation**: `year`, `month` and `day` columns derived from
//!   the event time, followed by a repartition on those columns
//! - **Overwrite guard**: production writes require dynamic partition overwrite
//! - **Count validation**: the data read back must match the dataframe within a
//!   relative tolerance
//!
//! Executing the write is left to the caller (see `hfs_arrow::LocalEngine::commit`
//! for a local implementation).

pub use validation::CountValidation;
pub use writer::{HistoricalWriter, HistoricalWriterBuilder, PARTITION_BY};

mod validation;
mod writer;
