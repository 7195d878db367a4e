//! CLI command implementations

pub mod plan;
pub mod validate;
pub mod write;

use anyhow::{Context, Result};
use hfs_arrow::{ArrowFrame, LocalEngine};
use hfs_core::storage::PATH_OPTION;
use hfs_core::{Engine, FeatureSet, StorageOptions, WriteMode, PARTITION_OVERWRITE_MODE_KEY};
use hfs_writer::HistoricalWriter;

use crate::config::CliConfig;
use crate::FeatureSetArgs;

/// Everything a command needs to run one write cycle
pub struct Session {
    pub engine: LocalEngine,
    pub writer: HistoricalWriter<LocalEngine>,
    pub feature_set: FeatureSet,
    pub input: ArrowFrame,
}

impl Session {
    pub fn is_dry_run(&self) -> bool {
        self.writer.mode() == WriteMode::DryRun
    }
}

/// Builds the engine and writer from config and loads the input dataframe
pub async fn open_session(
    config: &CliConfig,
    args: &FeatureSetArgs,
    dry_run: bool,
    threshold: Option<f64>,
) -> Result<Session> {
    let engine = LocalEngine::new()
        .with_conf(
            PARTITION_OVERWRITE_MODE_KEY,
            config.engine.partition_overwrite_mode.clone(),
        )
        .with_compression(config.engine.compression_codec()?);

    let mut writer_config = config.writer.clone();
    writer_config.debug_mode |= dry_run;
    if let Some(threshold) = threshold {
        writer_config.validation_threshold = threshold;
    }
    let writer = HistoricalWriter::<LocalEngine>::from_config(&writer_config)?;

    let input = load_input(&engine, &args.input).await?;
    tracing::debug!(input = %args.input, rows = input.num_rows(), "Loaded input dataframe");

    Ok(Session {
        engine,
        writer,
        feature_set: FeatureSet::new(args.name.clone(), args.entity.clone()),
        input,
    })
}

async fn load_input(engine: &LocalEngine, path: &str) -> Result<ArrowFrame> {
    let mut options = StorageOptions::new();
    options.insert(PATH_OPTION.to_string(), path.to_string());
    engine
        .read("parquet", &options)
        .await
        .with_context(|| format!("Failed to read input '{}'", path))
}
