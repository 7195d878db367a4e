//! Local Arrow engine
//!
//! [`LocalEngine`] is a single-process engine over the local filesystem. It
//! keeps a runtime configuration map, a catalog of temporary views and
//! registered tables, and executes write plans as Hive-partitioned Parquet.
//!
//! ## Write semantics
//!
//! The storage config's save mode decides what happens to existing data:
//!
//! | Save mode       | Existing data                                           |
//! |-----------------|---------------------------------------------------------|
//! | `overwrite`     | replaced, scoped by the partition overwrite mode        |
//! | `append`        | kept, new files added next to it                        |
//! | `error`         | write fails                                             |
//! | `ignore`        | write silently skipped                                  |
//!
//! With `overwrite`, a `dynamic` partition overwrite mode replaces only the
//! partition directories present in the incoming data. `static` replaces the
//! whole table.

use arrow::datatypes::{Schema, SchemaRef};
use async_trait::async_trait;
use hfs_core::storage::{resolved_path, PATH_OPTION};
use hfs_core::{
    DataFrame, Engine, Error, OverwriteMode, PreWriteHook, Result, SaveMode, StorageOptions,
    WriteMode, WritePlan,
};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::parquet_io::{self, CompressionCodec};
use crate::{partition, ArrowFrame, SchemaCompatibilityHook};

const PARQUET: &str = "parquet";

/// A table registered in the engine catalog
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub path: PathBuf,
    pub schema: SchemaRef,
}

/// Outcome of [`LocalEngine::commit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Table or view the data went to
    pub target: String,
    /// Physical location, `None` for temporary views
    pub path: Option<PathBuf>,
    pub rows: u64,
    pub files: usize,
    /// Partition directories written, relative to `path`
    pub partitions: Vec<String>,
    /// True when the save mode was `ignore` and data already existed
    pub skipped: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    conf: RwLock<HashMap<String, String>>,
    views: RwLock<HashMap<String, ArrowFrame>>,
    tables: RwLock<HashMap<String, TableEntry>>,
}

/// Local filesystem engine
///
/// Cloning is cheap; clones share configuration and catalog.
#[derive(Debug, Clone, Default)]
pub struct LocalEngine {
    state: Arc<EngineState>,
    compression: CompressionCodec,
}

fn poisoned<T>(_: T) -> Error {
    Error::internal("engine state lock poisoned")
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a configuration value, builder style
    ///
    /// A poisoned state lock drops the value with a warning; use
    /// [`LocalEngine::set_conf`] to observe the error.
    pub fn with_conf(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if let Err(err) = self.set_conf(key.clone(), value) {
            warn!(key = %key, error = %err, "Configuration value dropped");
        }
        self
    }

    pub fn with_compression(mut self, compression: CompressionCodec) -> Self {
        self.compression = compression;
        self
    }

    pub fn compression(&self) -> CompressionCodec {
        self.compression
    }

    pub fn set_conf(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.state
            .conf
            .write()
            .map_err(poisoned)?
            .insert(key.into(), value.into());
        Ok(())
    }

    pub fn unset_conf(&self, key: &str) -> Result<()> {
        self.state.conf.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    /// Registers (or replaces) a temporary view
    pub fn register_temp_view(&self, name: impl Into<String>, frame: ArrowFrame) -> Result<()> {
        let name = name.into();
        debug!(view = %name, rows = frame.num_rows(), "Registering temporary view");
        self.state
            .views
            .write()
            .map_err(poisoned)?
            .insert(name, frame);
        Ok(())
    }

    /// Registers (or replaces) a table backed by files under `path`
    pub fn register_table(
        &self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        schema: SchemaRef,
    ) -> Result<()> {
        let name = name.into();
        let path = path.into();
        debug!(table = %name, path = %path.display(), "Registering table");
        self.state
            .tables
            .write()
            .map_err(poisoned)?
            .insert(name, TableEntry { path, schema });
        Ok(())
    }

    /// Looks up a registered table
    pub fn table(&self, name: &str) -> Result<Option<TableEntry>> {
        Ok(self.state.tables.read().map_err(poisoned)?.get(name).cloned())
    }

    /// Registers data already stored under `path` as table `name`
    ///
    /// Returns `false` (and registers nothing) when the path holds no data.
    pub async fn attach_table(&self, name: &str, path: impl Into<PathBuf>) -> Result<bool> {
        let path = path.into();
        let frame = match self.read_path(path.clone()).await {
            Ok(frame) => frame,
            Err(Error::TableNotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        };
        if frame.schema().fields().is_empty() {
            return Ok(false);
        }
        self.register_table(name, path, Arc::clone(frame.schema()))?;
        Ok(true)
    }

    pub fn has_temp_view(&self, name: &str) -> Result<bool> {
        Ok(self.state.views.read().map_err(poisoned)?.contains_key(name))
    }

    /// Executes a write plan
    ///
    /// Runs the plan's pre-write hooks first. A dry-run plan is registered as
    /// the temporary view `historical_feature_store__<table>`; a production
    /// plan is written as Hive-partitioned Parquet under the plan's path and
    /// registered as `<database>.<table>`.
    ///
    /// # Errors
    ///
    /// - Any error raised by a pre-write hook
    /// - `UnsupportedFormat` if the storage format is not parquet
    /// - `InvalidInput` if the path is not local, or if data exists and the
    ///   save mode is `error`
    /// - `StorageError` if writing fails
    pub async fn commit(&self, plan: WritePlan<ArrowFrame>) -> Result<CommitSummary> {
        let plan = plan.apply_pre_hooks().await?;

        match plan.write_mode {
            WriteMode::DryRun => {
                let view = plan.dry_run_view_name();
                let rows = plan.dataframe.count().await?;
                self.register_temp_view(&view, plan.dataframe)?;
                info!(view = %view, rows, "Dry run written to temporary view");
                Ok(CommitSummary {
                    target: view,
                    path: None,
                    rows,
                    files: 0,
                    partitions: vec![],
                    skipped: false,
                })
            }
            WriteMode::Production => self.write_table(plan).await,
        }
    }

    async fn write_table(&self, plan: WritePlan<ArrowFrame>) -> Result<CommitSummary> {
        let format = plan.storage_config.format();
        if !format.eq_ignore_ascii_case(PARQUET) {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }

        let root = local_path(plan.path()?)?;
        let table = plan.qualified_table_name();
        let job = HiveWrite {
            root: root.clone(),
            frame: plan.dataframe.clone(),
            partition_by: plan.partition_by.clone(),
            save_mode: plan.storage_config.mode(),
            overwrite_mode: self.partition_overwrite_mode().await?,
            compression: self.compression,
        };

        debug!(
            table = %table,
            path = %root.display(),
            save_mode = %job.save_mode,
            overwrite_mode = %job.overwrite_mode,
            "Writing partitioned parquet"
        );

        let outcome = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| Error::internal(format!("write task failed: {}", e)))??;

        if outcome.skipped {
            info!(table = %table, path = %root.display(), "Data exists, write ignored");
        } else {
            self.register_table(&table, &root, Arc::clone(plan.dataframe.schema()))?;
            info!(
                table = %table,
                path = %root.display(),
                rows = outcome.rows,
                files = outcome.files,
                partitions = outcome.partitions.len(),
                "Table written"
            );
        }

        Ok(CommitSummary {
            target: table,
            path: Some(root),
            rows: outcome.rows,
            files: outcome.files,
            partitions: outcome.partitions,
            skipped: outcome.skipped,
        })
    }

    async fn read_path(&self, root: PathBuf) -> Result<ArrowFrame> {
        let display = root.display().to_string();
        let tree = tokio::task::spawn_blocking(move || parquet_io::read_tree(&root))
            .await
            .map_err(|e| Error::internal(format!("read task failed: {}", e)))??;

        match tree {
            None => Err(Error::TableNotFound(display)),
            Some((Some(schema), batches)) => ArrowFrame::try_new(schema, batches),
            Some((None, _)) => Ok(ArrowFrame::empty(Arc::new(Schema::empty()))),
        }
    }
}

#[async_trait]
impl Engine for LocalEngine {
    type Frame = ArrowFrame;

    async fn conf(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.conf.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn read(&self, format: &str, options: &StorageOptions) -> Result<ArrowFrame> {
        if !format.eq_ignore_ascii_case(PARQUET) {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }
        let root = local_path(resolved_path(options)?)?;
        debug!(path = %root.display(), "Reading parquet");
        self.read_path(root).await
    }

    async fn read_table(&self, name: &str) -> Result<ArrowFrame> {
        let view = self.state.views.read().map_err(poisoned)?.get(name).cloned();
        if let Some(frame) = view {
            return Ok(frame);
        }

        match self.table(name)? {
            Some(entry) => {
                let mut options = StorageOptions::new();
                options.insert(PATH_OPTION.to_string(), entry.path.display().to_string());
                self.read(PARQUET, &options).await
            }
            None => {
                warn!(table = name, "No such table or view");
                Err(Error::TableNotFound(name.to_string()))
            }
        }
    }

    fn schema_compatibility_hook(
        &self,
        table_name: &str,
        database: &str,
    ) -> Arc<dyn PreWriteHook<ArrowFrame>> {
        Arc::new(SchemaCompatibilityHook::new(
            self.clone(),
            table_name,
            database,
        ))
    }
}

/// Accepts plain paths and `file://` URIs
fn local_path(path: &str) -> Result<PathBuf> {
    let path = path.strip_prefix("file://").unwrap_or(path);
    if path.contains("://") {
        return Err(Error::invalid_input(format!(
            "LocalEngine can only access local paths, got '{}'",
            path
        )));
    }
    Ok(PathBuf::from(path))
}

struct HiveWrite {
    root: PathBuf,
    frame: ArrowFrame,
    partition_by: Vec<String>,
    save_mode: SaveMode,
    overwrite_mode: OverwriteMode,
    compression: CompressionCodec,
}

#[derive(Debug, Default)]
struct WriteOutcome {
    rows: u64,
    files: usize,
    partitions: Vec<String>,
    skipped: bool,
}

impl HiveWrite {
    fn run(self) -> Result<WriteOutcome> {
        let exists = !parquet_io::list_data_files(&self.root)?.is_empty();
        match self.save_mode {
            SaveMode::ErrorIfExists if exists => {
                return Err(Error::invalid_input(format!(
                    "path {} already exists",
                    self.root.display()
                )))
            }
            SaveMode::Ignore if exists => {
                return Ok(WriteOutcome {
                    skipped: true,
                    ..Default::default()
                })
            }
            _ => {}
        }

        // one file per (physical partition, partition directory)
        let mut files = Vec::new();
        for (index, batch) in self.frame.partitions().iter().enumerate() {
            for (dir, slice) in partition::split_by_values(batch, &self.partition_by)? {
                files.push((index, dir, slice));
            }
        }
        let touched: BTreeSet<&str> = files.iter().map(|(_, dir, _)| dir.as_str()).collect();

        if self.save_mode == SaveMode::Overwrite && exists {
            match self.overwrite_mode {
                OverwriteMode::Static => remove_dir(&self.root)?,
                OverwriteMode::Dynamic => {
                    for dir in &touched {
                        remove_dir(&self.root.join(dir))?;
                    }
                }
            }
        }

        let commit_id = chrono::Utc::now().format("%Y%m%d%H%M%S%6f").to_string();
        let schema = Arc::clone(self.frame.schema());
        let mut outcome = WriteOutcome {
            partitions: touched.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        };

        for (index, dir, slice) in &files {
            let dir_path = self.root.join(dir);
            std::fs::create_dir_all(&dir_path).map_err(|e| {
                Error::internal(format!("failed to create {}: {}", dir_path.display(), e))
            })?;
            let file = dir_path.join(format!("part-{:05}-{}.parquet", index, commit_id));
            parquet_io::write_file(&file, &schema, std::slice::from_ref(slice), self.compression)?;

            outcome.rows += slice.num_rows() as u64;
            outcome.files += 1;
        }

        if files.is_empty() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                Error::internal(format!("failed to create {}: {}", self.root.display(), e))
            })?;
        }

        Ok(outcome)
    }
}

fn remove_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    debug!(path = %path.display(), "Removing existing data");
    std::fs::remove_dir_all(path)
        .map_err(|e| Error::internal(format!("failed to remove {}: {}", path.display(), e)))
}
