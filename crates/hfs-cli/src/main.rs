//! hfs - Historical Feature Store command line tool
//!
//! Commands:
//! - `plan` - Show the write plan for a feature set without writing
//! - `write` - Write a feature set into the historical store and validate it
//! - `validate` - Compare a feature set with what the store holds

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{plan, validate, write};

/// hfs - Historical Feature Store writer
#[derive(Parser)]
#[command(name = "hfs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write feature sets into the historical feature store", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HFS_CONFIG")]
    config: Option<String>,

    /// Local storage base path (used when no configuration file is found)
    #[arg(long, env = "FEATURE_STORE_LOCAL_PATH", default_value = ".hfs/store")]
    storage: String,

    /// Historical database name (used when no configuration file is found)
    #[arg(
        long,
        env = "FEATURE_STORE_HISTORICAL_DATABASE",
        default_value = "feature_store"
    )]
    database: String,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies the feature set and where its data comes from
#[derive(Args, Debug, Clone)]
pub struct FeatureSetArgs {
    /// Parquet file or directory holding the feature set dataframe
    #[arg(short, long)]
    input: String,

    /// Entity the feature set belongs to
    #[arg(short, long)]
    entity: String,

    /// Feature set name
    #[arg(short, long)]
    name: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the write plan for a feature set without writing anything
    Plan {
        #[command(flatten)]
        feature_set: FeatureSetArgs,

        /// Plan a dry run (temporary view instead of the real table)
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a feature set into the historical store, then validate it
    Write {
        #[command(flatten)]
        feature_set: FeatureSetArgs,

        /// Write to a temporary view instead of the real table
        #[arg(long)]
        dry_run: bool,

        /// Skip the post-write count validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Validate stored data against a feature set
    Validate {
        #[command(flatten)]
        feature_set: FeatureSetArgs,

        /// Override the configured validation threshold
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,hfs=info",
        1 => "info,hfs=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = config::load_config(cli.config.as_deref(), &cli.storage, &cli.database)?;

    match cli.command {
        Commands::Plan {
            feature_set,
            dry_run,
        } => {
            plan::run(&config, &feature_set, dry_run, &cli.output).await?;
        }

        Commands::Write {
            feature_set,
            dry_run,
            no_validate,
        } => {
            write::run(&config, &feature_set, dry_run, !no_validate, &cli.output).await?;
        }

        Commands::Validate {
            feature_set,
            threshold,
        } => {
            validate::run(&config, &feature_set, threshold).await?;
        }
    }

    Ok(())
}
