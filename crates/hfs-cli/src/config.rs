//! CLI configuration handling

use anyhow::{bail, Context, Result};
use hfs_arrow::CompressionCodec;
use hfs_core::config::WriterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Historical writer settings
    pub writer: WriterConfig,

    /// Local engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Value of spark.sql.sources.partitionOverwriteMode (dynamic, static)
    #[serde(default = "default_overwrite_mode")]
    pub partition_overwrite_mode: String,

    /// Compression codec (zstd, zstd1, zstd9, snappy, lz4, none)
    #[serde(default = "default_compression")]
    pub compression: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            partition_overwrite_mode: default_overwrite_mode(),
            compression: default_compression(),
        }
    }
}

fn default_overwrite_mode() -> String {
    "dynamic".to_string()
}

fn default_compression() -> String {
    "zstd".to_string()
}

impl EngineConfig {
    pub fn compression_codec(&self) -> Result<CompressionCodec> {
        parse_compression(&self.compression)
    }
}

pub fn parse_compression(name: &str) -> Result<CompressionCodec> {
    let codec = match name.trim().to_lowercase().as_str() {
        "zstd" | "zstd3" => CompressionCodec::ZstdLevel3,
        "zstd1" => CompressionCodec::ZstdLevel1,
        "zstd9" => CompressionCodec::ZstdLevel9,
        "snappy" => CompressionCodec::Snappy,
        "lz4" => CompressionCodec::Lz4,
        "none" | "uncompressed" => CompressionCodec::Uncompressed,
        other => bail!("Unknown compression codec '{}'", other),
    };
    Ok(codec)
}

/// Load configuration from file or defaults
pub fn load_config(
    config_path: Option<&str>,
    storage_path: &str,
    database: &str,
) -> Result<CliConfig> {
    if let Some(path) = config_path {
        return load_from_file(path);
    }

    let default_locations = [
        ".hfs/config.yaml",
        ".hfs/config.yml",
        "hfs.yaml",
        "hfs.yml",
    ];

    for location in &default_locations {
        if Path::new(location).exists() {
            return load_from_file(location);
        }
    }

    tracing::debug!(storage = storage_path, database, "No configuration file, using defaults");
    Ok(CliConfig {
        writer: WriterConfig::local(database, storage_path)?,
        engine: EngineConfig::default(),
    })
}

/// Reads a CLI config (`writer` + `engine`) or a bare writer config
fn load_from_file(path: &str) -> Result<CliConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    let config: CliConfig = if path.ends_with(".json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path))?
    } else {
        let value: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;
        if value.get("writer").is_none() {
            let writer = hfs_core::config::load(path)
                .with_context(|| format!("Invalid writer configuration in {}", path))?;
            return Ok(CliConfig {
                writer,
                engine: EngineConfig::default(),
            });
        }
        serde_yaml::from_value(value)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?
    };

    config
        .writer
        .validate()
        .with_context(|| format!("Invalid writer configuration in {}", path))?;
    config.engine.compression_codec()?;
    Ok(config)
}
