//! The `profile` command: one pass with type inference, then reports.

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    cli::ProfileArgs,
    columns,
    config::LoadConfig,
    ddl, frequency,
    process::{self, ColumnStream},
    profile::Profiler,
    table,
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let config = LoadConfig::from_args(&args.reader)?;
    let input = &args.reader.input;
    let reader_config = process::pass_reader_config(&config, false);
    let stream = ColumnStream::open(input, &config, &reader_config)?;
    let outcome = process::run_pass::<_, std::io::Sink>(stream, &config, true, None)
        .with_context(|| format!("Profiling {input:?}"))?;
    let profiler = outcome
        .profiler
        .ok_or_else(|| anyhow!("Profiling pass produced no profile"))?;

    print_summary(&profiler);
    if let Some(top) = args.top {
        let headers = ["column", "value", "count", "percent"].map(String::from);
        table::print_table(&headers, &frequency::top_frequency_rows(profiler.columns(), top));
    }
    if args.ddl {
        let table_name = match &args.table {
            Some(name) => columns::sql_table_name(name),
            None => columns::default_table_name(input),
        };
        println!(
            "{}",
            ddl::create_table_statement(profiler.columns(), &table_name, args.varchar)
        );
    }
    if let Some(path) = &args.freq_file {
        frequency::save_frequencies(path, profiler.columns())?;
        info!("Frequencies written to {path:?}");
    }
    if let Some(path) = &args.report {
        profiler
            .report(config.profile.frequencies)
            .save(path)
            .with_context(|| format!("Saving profile report to {path:?}"))?;
        info!("Profile report written to {path:?}");
    }

    info!(
        "Profiled {} record(s) across {} column(s) from {:?} ({} line(s), {} byte(s))",
        outcome.summary.rows_processed,
        outcome.columns.len(),
        input,
        outcome.summary.lines_read,
        outcome.summary.bytes_read
    );
    Ok(())
}

fn print_summary(profiler: &Profiler) {
    let headers = ["#", "column", "type", "max_len", "non_empty", "distinct"].map(String::from);
    let rows = profiler
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.name().to_string(),
                column
                    .final_type()
                    .map_or_else(|| "undetermined".to_string(), |t| t.to_string()),
                column.max_len().to_string(),
                column.non_empty().to_string(),
                column.frequencies().len().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
