//! Post-write count validation
//!
//! After a write, the data is read back and its row count compared with the
//! feature set dataframe. Counts may differ by a relative tolerance: with a
//! threshold `t` and `w` rows read back, a dataframe count `d` passes iff
//!
//! ```text
//! (1 - t) * w <= d <= (1 + t) * w
//! ```
//!
//! A threshold of zero demands an exact match.

use hfs_core::{Error, Result};

/// Count tolerance check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountValidation {
    threshold: f64,
}

impl CountValidation {
    /// Creates a check with the given relative tolerance
    ///
    /// # Errors
    ///
    /// `ConfigError` if `threshold` is not a finite value in [0, 1].
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "validation_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    /// A check that requires identical counts
    pub fn exact() -> Self {
        Self { threshold: 0.0 }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Inclusive lower and upper bounds for the dataframe count
    pub fn bounds(&self, written_count: u64) -> (f64, f64) {
        let written = written_count as f64;
        (
            (1.0 - self.threshold) * written,
            (1.0 + self.threshold) * written,
        )
    }

    pub fn is_within(&self, written_count: u64, dataframe_count: u64) -> bool {
        let (lower, upper) = self.bounds(written_count);
        let dataframe = dataframe_count as f64;
        lower <= dataframe && dataframe <= upper
    }

    /// Fails with `CountMismatch` when the counts are outside the tolerance band
    pub fn check(&self, table_name: &str, written_count: u64, dataframe_count: u64) -> Result<()> {
        if self.is_within(written_count, dataframe_count) {
            return Ok(());
        }

        let (lower, upper) = self.bounds(written_count);
        tracing::warn!(
            table = table_name,
            written_count,
            dataframe_count,
            lower,
            upper,
            "Count validation failed"
        );
        Err(Error::CountMismatch {
            table: table_name.to_string(),
            written: written_count,
            dataframe: dataframe_count,
        })
    }
}
