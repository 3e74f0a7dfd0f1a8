//! Frequency output for profiled columns.
//!
//! The frequency file lists every tracked value of every column, sorted by
//! value; [`top_frequency_rows`] renders the most common values as table rows.

use std::{
    io::Write,
    path::Path,
};

use anyhow::{Context, Result};

use crate::{
    io_utils,
    profile::{ColumnProfile, sorted_frequencies},
};

/// Write one block per column: a `FLD:` header, its `=` underline, the
/// `Value\tCount` heading, sorted entries and a blank separator line.
pub fn write_frequencies<W: Write>(writer: &mut W, columns: &[ColumnProfile]) -> Result<()> {
    for column in columns {
        let header = format!("FLD: {} ({})", column.name(), column.frequencies().len());
        writeln!(writer, "{header}")?;
        writeln!(writer, "{}", "=".repeat(header.chars().count()))?;
        writeln!(writer, "Value\tCount")?;
        writeln!(writer, "=====\t=====")?;
        for (value, count) in sorted_frequencies(column) {
            writeln!(writer, "{value}\t{count}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn save_frequencies(path: &Path, columns: &[ColumnProfile]) -> Result<()> {
    let mut writer = io_utils::open_output(Some(path))?;
    write_frequencies(&mut writer, columns)
        .with_context(|| format!("Writing frequency file {path:?}"))?;
    writer.flush().context("Flushing frequency file")
}

/// Rows of `column, value, count, percent` holding each column's `top` most
/// common values (all of them when `top` is 0).
pub fn top_frequency_rows(columns: &[ColumnProfile], top: usize) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for column in columns {
        let total = column.non_empty();
        if total == 0 {
            continue;
        }
        let mut items = sorted_frequencies(column);
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if top > 0 {
            items.truncate(top);
        }
        rows.extend(items.into_iter().map(|(value, count)| {
            let percent = (count as f64 / total as f64) * 100.0;
            vec![
                column.name().to_string(),
                value,
                count.to_string(),
                format!("{percent:.2}%"),
            ]
        }));
    }
    rows
}
