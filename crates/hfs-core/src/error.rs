//! Error types for the historical feature store writer
//!
//! Every failure the writer can surface is a variant of [`Error`]. Policy
//! failures (overwrite mode, row-count mismatch) carry the values the caller
//! needs to diagnose the incident. Upstream failures from an engine or storage
//! layer are wrapped without translation.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors that can occur while preparing or validating a write
#[derive(Error, Debug)]
pub enum Error {
    /// The engine is not configured for dynamic partition overwrite
    ///
    /// Static overwrite would delete every partition of the table that is not
    /// present in the incoming data. The observed value is kept verbatim.
    #[error(
        "m=load_incremental, spark.sql.sources.partitionOverwriteMode={0}, \
         msg=partitionOverwriteMode have to be configured to 'dynamic'"
    )]
    PartitionOverwriteMode(String),

    /// Rows read back from the store differ from the dataframe beyond tolerance
    #[error(
        "Data written to the Historical Feature Store and read back from {table} has a \
         different count than the feature set dataframe. \
         Number of rows in {table}: {written}. \
         Number of rows in the dataframe: {dataframe}."
    )]
    CountMismatch {
        table: String,
        written: u64,
        dataframe: u64,
    },

    /// Incoming dataframe has columns the existing table does not know about
    #[error("The dataframe has a schema incompatible with table '{table}': unknown columns {columns:?}")]
    SchemaIncompatible { table: String, columns: Vec<String> },

    /// Column referenced by an expression or repartition key does not exist
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// Table or temporary view is not registered with the engine
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Serialization format the engine cannot read or write
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input from the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error (object store, filesystem, columnar codec)
    #[error("Storage error: {0}")]
    StorageError(#[from] anyhow::Error),

    /// Internal error - this should rarely happen
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl Error {
    /// Creates a ConfigError from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Creates an InvalidInput error from a string
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an InternalError from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Wraps any storage-layer error, keeping its message
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageError(anyhow::Error::new(err))
    }
}
