//! Write a feature set into the historical store

use anyhow::{Context, Result};
use comfy_table::Cell;
use hfs_core::storage::resolved_path;
use serde::Serialize;

use crate::config::CliConfig;
use crate::output::{
    create_table, format_count, format_mode, print_error, print_info, print_success,
    print_structured, print_warning,
};
use crate::FeatureSetArgs;

use super::open_session;

#[derive(Debug, Serialize)]
struct WriteReport {
    target: String,
    path: Option<String>,
    dry_run: bool,
    rows: u64,
    files: usize,
    partitions: Vec<String>,
    skipped: bool,
    validated: bool,
}

pub async fn run(
    config: &CliConfig,
    args: &FeatureSetArgs,
    dry_run: bool,
    validate: bool,
    output: &str,
) -> Result<()> {
    let session = open_session(config, args, dry_run, None).await?;
    let feature_set = &session.feature_set;
    let engine = &session.engine;

    if !session.is_dry_run() {
        // make the existing table known so the schema check can see it
        let options = session
            .writer
            .storage_config()
            .options(&feature_set.storage_key())?;
        let table = format!("{}.{}", session.writer.database(), feature_set.name);
        if engine.attach_table(&table, resolved_path(&options)?).await? {
            tracing::debug!(table = %table, "Attached existing table");
        }
    }

    print_info(&format!(
        "Writing feature set '{}' ({} rows)",
        feature_set.name,
        format_count(session.input.num_rows() as u64)
    ));

    let plan = session
        .writer
        .prepare_for_write(feature_set, session.input.clone(), engine)
        .await?;
    let summary = engine
        .commit(plan)
        .await
        .with_context(|| format!("Failed to write feature set '{}'", feature_set.name))?;

    let mut validated = false;
    if validate && !summary.skipped {
        if let Err(err) = session
            .writer
            .validate(feature_set, &session.input, engine)
            .await
        {
            print_error(&err.to_string());
            return Err(err.into());
        }
        validated = true;
    }

    let report = WriteReport {
        target: summary.target,
        path: summary.path.map(|p| p.display().to_string()),
        dry_run: session.is_dry_run(),
        rows: summary.rows,
        files: summary.files,
        partitions: summary.partitions,
        skipped: summary.skipped,
        validated,
    };

    if print_structured(&report, output)? {
        return Ok(());
    }

    if report.skipped {
        print_warning(&format!(
            "{} already holds data, write skipped (save mode 'ignore')",
            report.target
        ));
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec![Cell::new("Mode"), format_mode(report.dry_run)]);
    table.add_row(vec!["Target".to_string(), report.target.clone()]);
    if let Some(path) = &report.path {
        table.add_row(vec!["Path".to_string(), path.clone()]);
    }
    table.add_row(vec!["Rows".to_string(), format_count(report.rows)]);
    table.add_row(vec!["Files".to_string(), report.files.to_string()]);
    table.add_row(vec![
        "Partitions written".to_string(),
        report.partitions.len().to_string(),
    ]);
    println!("{table}");

    if report.validated {
        print_success(&format!(
            "Wrote and validated {} (threshold {})",
            report.target,
            session.writer.validation_threshold()
        ));
    } else {
        print_success(&format!("Wrote {}", report.target));
    }

    Ok(())
}
