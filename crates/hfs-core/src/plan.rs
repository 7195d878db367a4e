//! Write plans
//!
//! A [`WritePlan`] describes a historical write without executing it. Whoever
//! commits the write (an engine, an orchestrator) reads the target identity and
//! partitioning from the plan and runs its pre-write hooks first.

use std::fmt;
use std::sync::Arc;

use crate::storage::{resolved_path, StorageConfig, StorageOptions};
use crate::{DataFrame, PreWriteHook, Result, WriteMode};

/// Prefix of the temporary view a dry-run write lands in
pub const DRY_RUN_TABLE_PREFIX: &str = "historical_feature_store__";

/// Everything needed to persist one feature set
pub struct WritePlan<F: DataFrame> {
    /// Dataframe with partition columns, already repartitioned
    pub dataframe: F,

    /// Storage configuration the write resolves against
    pub storage_config: Arc<dyn StorageConfig>,

    /// Minimal options for the write, always carrying `path`
    pub options: StorageOptions,

    /// Metastore database of the target table
    pub database: String,

    /// Target table name (the feature set name)
    pub table_name: String,

    /// Ordered partition columns
    pub partition_by: Vec<String>,

    /// Hooks to run, in order, before the data is persisted
    pub pre_hooks: Vec<Arc<dyn PreWriteHook<F>>>,

    /// Where the write lands
    pub write_mode: WriteMode,
}

impl<F: DataFrame> WritePlan<F> {
    /// Physical location of the write
    pub fn path(&self) -> Result<&str> {
        resolved_path(&self.options)
    }

    /// `database.table` identity of the metastore table
    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.database, self.table_name)
    }

    /// Name of the temporary view a dry-run write registers
    pub fn dry_run_view_name(&self) -> String {
        format!("{}{}", DRY_RUN_TABLE_PREFIX, self.table_name)
    }

    /// Runs every pre-write hook in order, replacing the plan's dataframe
    ///
    /// The first failing hook aborts and its error is returned unchanged.
    pub async fn apply_pre_hooks(mut self) -> Result<Self> {
        let mut frame = self.dataframe;
        for hook in &self.pre_hooks {
            tracing::debug!(hook = hook.name(), table = %self.table_name, "Running pre-write hook");
            frame = hook.run(frame).await?;
        }
        self.dataframe = frame;
        Ok(self)
    }
}

impl<F: DataFrame> fmt::Debug for WritePlan<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritePlan")
            .field("storage_config", &self.storage_config)
            .field("options", &self.options)
            .field("database", &self.database)
            .field("table_name", &self.table_name)
            .field("partition_by", &self.partition_by)
            .field(
                "pre_hooks",
                &self.pre_hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("write_mode", &self.write_mode)
            .finish_non_exhaustive()
    }
}
