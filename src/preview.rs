use anyhow::Result;
use log::info;

use crate::{
    cli::PreviewArgs,
    config::LoadConfig,
    process::{self, ColumnStream},
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = LoadConfig::from_args(&args.reader)?;
    let reader_config = process::pass_reader_config(&config, false);
    let mut stream = ColumnStream::open(&args.reader.input, &config, &reader_config)?;

    let mut rows = Vec::new();
    while rows.len() < args.rows {
        match stream.next_record()? {
            Some(record) => rows.push(record),
            None => break,
        }
    }

    table::print_table(stream.columns(), &rows);
    info!(
        "Displayed {} record(s) from {:?}",
        rows.len(),
        args.reader.input
    );
    Ok(())
}
