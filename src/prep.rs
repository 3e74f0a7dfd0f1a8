//! The `prep` command: rewrite the input as a tab-delimited, unquoted file.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PrepArgs,
    config::LoadConfig,
    io_utils,
    process::{self, ColumnStream},
};

pub fn execute(args: &PrepArgs) -> Result<()> {
    let config = LoadConfig::from_args(&args.reader)?;
    let input = &args.reader.input;
    let profile = args.profile || args.report.is_some();
    let reader_config = process::pass_reader_config(&config, true);
    let stream = ColumnStream::open(input, &config, &reader_config)?;
    let mut writer = io_utils::open_prep_writer(args.output.as_deref())?;
    let outcome = process::run_pass(stream, &config, profile, Some(&mut writer))
        .with_context(|| format!("Preparing {input:?}"))?;

    if let Some(profiler) = &outcome.profiler {
        for column in profiler.columns() {
            info!(
                "Column '{}': {}",
                column.name(),
                column
                    .padded_type()
                    .map_or_else(|| "undetermined".to_string(), |t| t.to_string())
            );
        }
        if let Some(path) = &args.report {
            profiler
                .report(config.profile.frequencies)
                .save(path)
                .with_context(|| format!("Saving profile report to {path:?}"))?;
        }
    }

    let destination = args
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".into());
    info!(
        "Wrote {} record(s) with {} column(s) to {}",
        outcome.summary.records_written,
        outcome.columns.len(),
        destination
    );
    Ok(())
}
