//! Core data types for the historical feature store
//!
//! These types are shared by the writer and by every engine implementation.
//! They are kept small and free of engine specifics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Event-time column every feature set dataframe carries
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Partition column holding the calendar year of the event time
pub const PARTITION_YEAR: &str = "year";

/// Partition column holding the calendar month of the event time
pub const PARTITION_MONTH: &str = "month";

/// Partition column holding the day of month of the event time
pub const PARTITION_DAY: &str = "day";

/// Engine configuration key that controls partition overwrite behaviour
pub const PARTITION_OVERWRITE_MODE_KEY: &str = "spark.sql.sources.partitionOverwriteMode";

/// A named collection of features computed for one entity
///
/// The writer only reads the two identifying fields. Everything else about a
/// feature set (its features, keys, transformations) is owned upstream.
///
/// # Examples
///
/// ```
/// use hfs_core::FeatureSet;
///
/// let fs = FeatureSet::new("user_features", "user");
/// assert_eq!(fs.storage_key(), "historical/user/user_features");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Logical table name
    pub name: String,

    /// Entity the features describe, used as a storage path segment
    pub entity: String,
}

impl FeatureSet {
    /// Creates a new feature set identity
    pub fn new(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
        }
    }

    /// Storage key under which the feature set's historical data lives
    ///
    /// Always `historical/{entity}/{name}`, independent of database or
    /// partitioning configuration.
    pub fn storage_key(&self) -> String {
        ["historical", self.entity.as_str(), self.name.as_str()].join("/")
    }
}

/// Calendar field extracted from a temporal column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    Month,
    /// Day of month (1-31)
    Day,
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatePart::Year => write!(f, "year"),
            DatePart::Month => write!(f, "month"),
            DatePart::Day => write!(f, "dayofmonth"),
        }
    }
}

/// Column expression an engine evaluates when adding a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnExpr {
    /// Integer calendar field of a timestamp or date column
    DatePart { part: DatePart, column: String },
}

impl ColumnExpr {
    pub fn year(column: &str) -> Self {
        Self::DatePart {
            part: DatePart::Year,
            column: column.to_string(),
        }
    }

    pub fn month(column: &str) -> Self {
        Self::DatePart {
            part: DatePart::Month,
            column: column.to_string(),
        }
    }

    pub fn day_of_month(column: &str) -> Self {
        Self::DatePart {
            part: DatePart::Day,
            column: column.to_string(),
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnExpr::DatePart { part, column } => write!(f, "{}({})", part, column),
        }
    }
}

/// How an engine treats existing partitions when overwriting a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverwriteMode {
    /// Only partitions present in the incoming data are replaced
    Dynamic,
    /// Every partition of the table is replaced
    Static,
}

impl FromStr for OverwriteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dynamic" => Ok(Self::Dynamic),
            "static" => Ok(Self::Static),
            _ => Err(Error::PartitionOverwriteMode(s.to_lowercase())),
        }
    }
}

impl fmt::Display for OverwriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverwriteMode::Dynamic => write!(f, "dynamic"),
            OverwriteMode::Static => write!(f, "static"),
        }
    }
}

/// Whether writes target the real table or a temporary, non-authoritative view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Writes land in object storage and the metastore table
    #[default]
    Production,
    /// "Dry run": writes land in a temporary view named after the feature set
    DryRun,
}

impl WriteMode {
    /// Maps the classic `debug_mode` flag onto a mode
    pub fn from_debug_flag(debug_mode: bool) -> Self {
        if debug_mode {
            Self::DryRun
        } else {
            Self::Production
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Behaviour of a write when the target already holds data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    #[default]
    Overwrite,
    Append,
    ErrorIfExists,
    Ignore,
}

impl FromStr for SaveMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            "error" | "errorifexists" | "error_if_exists" => Ok(Self::ErrorIfExists),
            "ignore" => Ok(Self::Ignore),
            other => Err(Error::config(format!("unknown save mode '{}'", other))),
        }
    }
}

impl fmt::Display for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveMode::Overwrite => "overwrite",
            SaveMode::Append => "append",
            SaveMode::ErrorIfExists => "error",
            SaveMode::Ignore => "ignore",
        };
        write!(f, "{}", s)
    }
}
