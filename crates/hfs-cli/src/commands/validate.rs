//! Validate stored data against a feature set

use anyhow::Result;

use crate::config::CliConfig;
use crate::output::{print_error, print_info, print_success};
use crate::FeatureSetArgs;

use super::open_session;

pub async fn run(config: &CliConfig, args: &FeatureSetArgs, threshold: Option<f64>) -> Result<()> {
    let session = open_session(config, args, false, threshold).await?;
    let table = session.writer.validation_table_name(&session.feature_set);

    print_info(&format!(
        "Validating {} against {} (threshold {})",
        table,
        args.input,
        session.writer.validation_threshold()
    ));

    match session
        .writer
        .validate(&session.feature_set, &session.input, &session.engine)
        .await
    {
        Ok(()) => {
            print_success(&format!("Row counts of {} are within tolerance", table));
            Ok(())
        }
        Err(err) => {
            print_error(&err.to_string());
            Err(err.into())
        }
    }
}
