//! Show the write plan for a feature set

use anyhow::Result;
use comfy_table::Cell;
use hfs_core::DataFrame;
use serde::Serialize;

use crate::config::CliConfig;
use crate::output::{create_table, format_count, format_mode, print_info, print_structured};
use crate::FeatureSetArgs;

use super::open_session;

#[derive(Debug, Serialize)]
struct PlanReport {
    table: String,
    target: String,
    path: String,
    dry_run: bool,
    rows: u64,
    num_partitions: usize,
    partition_by: Vec<String>,
    columns: Vec<String>,
    pre_hooks: Vec<String>,
}

pub async fn run(
    config: &CliConfig,
    args: &FeatureSetArgs,
    dry_run: bool,
    output: &str,
) -> Result<()> {
    let session = open_session(config, args, dry_run, None).await?;

    let plan = session
        .writer
        .prepare_for_write(&session.feature_set, session.input.clone(), &session.engine)
        .await?;

    let dry_run = session.is_dry_run();
    let report = PlanReport {
        table: plan.qualified_table_name(),
        target: if dry_run {
            plan.dry_run_view_name()
        } else {
            plan.qualified_table_name()
        },
        path: plan.path()?.to_string(),
        dry_run,
        rows: plan.dataframe.count().await?,
        num_partitions: plan.dataframe.num_partitions(),
        partition_by: plan.partition_by.clone(),
        columns: plan.dataframe.column_names(),
        pre_hooks: plan.pre_hooks.iter().map(|h| h.name().to_string()).collect(),
    };

    if print_structured(&report, output)? {
        return Ok(());
    }

    print_info(&format!(
        "Write plan for feature set '{}' (nothing written)",
        session.feature_set.name
    ));

    let mut table = create_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec![Cell::new("Mode"), format_mode(report.dry_run)]);
    table.add_row(vec!["Table", report.table.as_str()]);
    table.add_row(vec!["Target", report.target.as_str()]);
    table.add_row(vec!["Path", report.path.as_str()]);
    table.add_row(vec!["Rows".to_string(), format_count(report.rows)]);
    table.add_row(vec![
        "Partitions".to_string(),
        report.num_partitions.to_string(),
    ]);
    table.add_row(vec!["Partition by".to_string(), report.partition_by.join(", ")]);
    table.add_row(vec!["Columns".to_string(), report.columns.join(", ")]);
    table.add_row(vec!["Pre-write hooks".to_string(), report.pre_hooks.join(", ")]);
    println!("{table}");

    Ok(())
}
