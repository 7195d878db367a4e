//! Dataframe abstraction
//!
//! A [`DataFrame`] is an immutable columnar table owned by some engine. Each
//! transformation returns a new value; nothing is mutated in place. Counting
//! forces a full pass over the data and is therefore async.

use async_trait::async_trait;

use crate::{ColumnExpr, Result};

#[async_trait]
pub trait DataFrame: Clone + Send + Sync + 'static {
    /// Column names in schema order
    fn column_names(&self) -> Vec<String>;

    /// Returns a new frame with `name` set to the result of `expr`
    ///
    /// An existing column with the same name is replaced.
    ///
    /// # Errors
    ///
    /// - `ColumnNotFound` if `expr` references a missing column
    /// - `InvalidInput` if the referenced column has an unsupported type
    fn with_column(&self, name: &str, expr: &ColumnExpr) -> Result<Self>;

    /// Redistributes rows into `num_partitions` physical partitions keyed by `columns`
    ///
    /// Rows with equal key values always land in the same partition. Row count
    /// and row contents are preserved.
    fn repartition(&self, columns: &[&str], num_partitions: usize) -> Result<Self>;

    /// Number of physical partitions
    fn num_partitions(&self) -> usize;

    /// Counts the rows of the frame
    async fn count(&self) -> Result<u64>;
}
