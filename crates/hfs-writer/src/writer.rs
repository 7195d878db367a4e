//! Historical Feature Store writer
//!
//! Prepares feature set dataframes for the partitioned historical store and
//! validates them after the write.
//!
//! ## Write cycle
//!
//! ```text
//! CONSTRUCTED ──prepare_for_write──► PLAN_READY ──(commit, external)──► validate ──► VALIDATED | FAILED
//! ```
//!
//! The writer holds only configuration. One instance can be shared across
//! feature sets and concurrent cycles.
//!
//! ## Partitioning
//!
//! Data is stored in partition folders based on the event time (year, month,
//! day). Writes require the engine to use *dynamic* partition overwrite, so that
//! only the partitions present in the incoming data are replaced and every other
//! partition stays intact.

use std::fmt;
use std::sync::Arc;

use hfs_core::config::{WriterConfig, DEFAULT_NUM_PARTITIONS, DEFAULT_VALIDATION_THRESHOLD};
use hfs_core::storage::{resolved_path, StorageConfig, StorageOptions, PATH_OPTION};
use hfs_core::{
    ColumnExpr, DataFrame, Engine, Error, FeatureSet, OverwriteMode, PreWriteHook, Result,
    WriteMode, WritePlan, DRY_RUN_TABLE_PREFIX, PARTITION_DAY, PARTITION_MONTH, PARTITION_YEAR,
    TIMESTAMP_COLUMN,
};
use tracing::{debug, info, warn};

use crate::validation::CountValidation;

/// Partition columns, in write order
pub const PARTITION_BY: [&str; 3] = [PARTITION_YEAR, PARTITION_MONTH, PARTITION_DAY];

/// Writes feature sets into the Historical Feature Store
///
/// # Example
///
/// ```rust,ignore
/// let writer = HistoricalWriter::builder(Arc::new(S3Config::new("bucket")), "feature_store")
///     .validation_threshold(0.01)
///     .build()?;
///
/// let plan = writer.prepare_for_write(&feature_set, dataframe.clone(), &engine).await?;
/// engine.commit(plan).await?;
/// writer.validate(&feature_set, &dataframe, &engine).await?;
/// ```
pub struct HistoricalWriter<E: Engine> {
    storage_config: Arc<dyn StorageConfig>,
    database: String,
    num_partitions: usize,
    validation: CountValidation,
    mode: WriteMode,
    check_schema: Option<Arc<dyn PreWriteHook<E::Frame>>>,
}

impl<E: Engine> HistoricalWriter<E> {
    /// Display name of the writer
    pub const NAME: &'static str = "Historical Feature Store Writer";

    /// Starts building a writer for `database` backed by `storage_config`
    pub fn builder(
        storage_config: Arc<dyn StorageConfig>,
        database: impl Into<String>,
    ) -> HistoricalWriterBuilder<E> {
        HistoricalWriterBuilder {
            storage_config,
            database: database.into(),
            num_partitions: DEFAULT_NUM_PARTITIONS,
            validation_threshold: DEFAULT_VALIDATION_THRESHOLD,
            mode: WriteMode::Production,
            check_schema: None,
        }
    }

    /// Builds a writer from a loaded configuration
    pub fn from_config(config: &WriterConfig) -> Result<Self> {
        Self::builder(config.storage.build(), config.database.clone())
            .num_partitions(config.num_partitions)
            .validation_threshold(config.validation_threshold)
            .mode(config.write_mode())
            .build()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    pub fn validation_threshold(&self) -> f64 {
        self.validation.threshold()
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn storage_config(&self) -> &Arc<dyn StorageConfig> {
        &self.storage_config
    }

    /// Prepares `dataframe` to be saved to the Historical Feature Store
    ///
    /// Adds the year/month/day partition columns, repartitions the data and,
    /// outside dry-run mode, checks that the engine overwrites partitions
    /// dynamically. The returned plan is not executed.
    ///
    /// # Errors
    ///
    /// - `PartitionOverwriteMode` if the engine is not in dynamic overwrite mode
    /// - `ConfigError` if the storage config resolves no path
    /// - Engine errors (e.g. missing timestamp column) are returned unchanged
    pub async fn prepare_for_write(
        &self,
        feature_set: &FeatureSet,
        dataframe: E::Frame,
        engine: &E,
    ) -> Result<WritePlan<E::Frame>> {
        match self.mode {
            WriteMode::Production => self.check_overwrite_mode(engine).await?,
            WriteMode::DryRun => {
                debug!(feature_set = %feature_set.name, "Dry run, skipping overwrite mode check")
            }
        }

        let dataframe = self.create_partitions(dataframe)?;

        let storage_key = feature_set.storage_key();
        let resolved = self.storage_config.options(&storage_key)?;
        let path = resolved_path(&resolved)?.to_string();
        debug!(key = %storage_key, path = %path, "Resolved storage path");

        let mut options = StorageOptions::new();
        options.insert(PATH_OPTION.to_string(), path.clone());

        let check_schema = match &self.check_schema {
            Some(hook) => Arc::clone(hook),
            None => engine.schema_compatibility_hook(&feature_set.name, &self.database),
        };

        let plan = WritePlan {
            dataframe,
            storage_config: Arc::clone(&self.storage_config),
            options,
            database: self.database.clone(),
            table_name: feature_set.name.clone(),
            partition_by: PARTITION_BY.iter().map(|c| c.to_string()).collect(),
            pre_hooks: vec![check_schema],
            write_mode: self.mode,
        };

        info!(
            table = %plan.qualified_table_name(),
            path = %path,
            num_partitions = self.num_partitions,
            mode = ?self.mode,
            "Write plan ready"
        );

        Ok(plan)
    }

    /// Validates the written data against the feature set dataframe
    ///
    /// Reads the persisted data back, counts it and compares with the row
    /// count of `dataframe` (the frame as passed in, before partitioning).
    ///
    /// # Errors
    ///
    /// - `CountMismatch` if the counts differ beyond the validation threshold
    /// - Engine errors from reading or counting are returned unchanged
    pub async fn validate(
        &self,
        feature_set: &FeatureSet,
        dataframe: &E::Frame,
        engine: &E,
    ) -> Result<()> {
        let table_name = self.validation_table_name(feature_set);

        let written = match self.mode {
            WriteMode::Production => {
                let options = self.storage_config.options(&feature_set.storage_key())?;
                engine.read(self.storage_config.format(), &options).await?
            }
            WriteMode::DryRun => engine.read_table(&table_name).await?,
        };
        let written_count = written.count().await?;
        let dataframe_count = dataframe.count().await?;

        self.validation
            .check(&table_name, written_count, dataframe_count)?;

        info!(
            table = %table_name,
            written_count,
            dataframe_count,
            "Count validation passed"
        );
        Ok(())
    }

    /// Table identity `validate` reads back
    ///
    /// `database.name` in production, `historical_feature_store__name` in a dry run.
    pub fn validation_table_name(&self, feature_set: &FeatureSet) -> String {
        match self.mode {
            WriteMode::Production => format!("{}.{}", self.database, feature_set.name),
            WriteMode::DryRun => format!("{}{}", DRY_RUN_TABLE_PREFIX, feature_set.name),
        }
    }

    async fn check_overwrite_mode(&self, engine: &E) -> Result<()> {
        match engine.partition_overwrite_mode().await {
            Ok(OverwriteMode::Dynamic) => Ok(()),
            Ok(mode) => {
                warn!(%mode, "Refusing to write with non-dynamic partition overwrite mode");
                Err(Error::PartitionOverwriteMode(mode.to_string()))
            }
            Err(err) => {
                warn!(error = %err, "Unusable partition overwrite mode");
                Err(err)
            }
        }
    }

    fn create_partitions(&self, dataframe: E::Frame) -> Result<E::Frame> {
        let dataframe = dataframe
            .with_column(PARTITION_YEAR, &ColumnExpr::year(TIMESTAMP_COLUMN))?
            .with_column(PARTITION_MONTH, &ColumnExpr::month(TIMESTAMP_COLUMN))?
            .with_column(PARTITION_DAY, &ColumnExpr::day_of_month(TIMESTAMP_COLUMN))?;

        debug!(
            columns = ?PARTITION_BY,
            num_partitions = self.num_partitions,
            "Repartitioning by partition columns"
        );
        dataframe.repartition(&PARTITION_BY, self.num_partitions)
    }
}

impl<E: Engine> fmt::Debug for HistoricalWriter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricalWriter")
            .field("storage_config", &self.storage_config)
            .field("database", &self.database)
            .field("num_partitions", &self.num_partitions)
            .field("validation_threshold", &self.validation.threshold())
            .field("mode", &self.mode)
            .field(
                "check_schema",
                &self.check_schema.as_ref().map(|hook| hook.name().to_string()),
            )
            .finish()
    }
}

/// Builder for [`HistoricalWriter`]
pub struct HistoricalWriterBuilder<E: Engine> {
    storage_config: Arc<dyn StorageConfig>,
    database: String,
    num_partitions: usize,
    validation_threshold: f64,
    mode: WriteMode,
    check_schema: Option<Arc<dyn PreWriteHook<E::Frame>>>,
}

impl<E: Engine> HistoricalWriterBuilder<E> {
    /// Repartition target; `0` means [`DEFAULT_NUM_PARTITIONS`]
    pub fn num_partitions(mut self, num_partitions: usize) -> Self {
        self.num_partitions = match num_partitions {
            0 => DEFAULT_NUM_PARTITIONS,
            n => n,
        };
        self
    }

    pub fn validation_threshold(mut self, threshold: f64) -> Self {
        self.validation_threshold = threshold;
        self
    }

    pub fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same as `mode(WriteMode::from_debug_flag(debug_mode))`
    pub fn debug_mode(self, debug_mode: bool) -> Self {
        self.mode(WriteMode::from_debug_flag(debug_mode))
    }

    /// Uses `hook` instead of the engine's schema-compatibility hook
    pub fn check_schema(mut self, hook: Arc<dyn PreWriteHook<E::Frame>>) -> Self {
        self.check_schema = Some(hook);
        self
    }

    /// # Errors
    ///
    /// `ConfigError` for an empty database or a threshold outside [0, 1].
    pub fn build(self) -> Result<HistoricalWriter<E>> {
        if self.database.trim().is_empty() {
            return Err(Error::config("database must not be empty"));
        }
        let validation = CountValidation::new(self.validation_threshold)?;

        Ok(HistoricalWriter {
            storage_config: self.storage_config,
            database: self.database,
            num_partitions: self.num_partitions,
            validation,
            mode: self.mode,
            check_schema: self.check_schema,
        })
    }
}
