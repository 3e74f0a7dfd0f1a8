//! Column naming for flat files.
//!
//! Names come from a column-names file, the configured header line, or are
//! synthesized as `col0`, `col1`, ... in that order of preference. The SQL
//! helpers turn arbitrary names into identifiers a `CREATE TABLE` accepts.

use std::{fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use regex::Regex;

pub const DEFAULT_SCHEMA: &str = "dbo";

fn needs_brackets_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9A-Za-z_]").expect("valid identifier pattern"))
}

/// Where a run's column names came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    ColumnFile,
    HeaderLine,
    Synthetic,
}

/// One name per non-blank line, trimmed.
pub fn read_column_file(path: &Path) -> Result<Vec<String>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Reading column file {path:?}"))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn synthetic_names(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("col{idx}")).collect()
}

/// Pick column names by priority. `field_count` sizes synthetic names and is
/// normally the width of the first record read.
pub fn resolve_column_names(
    col_file: Option<&Path>,
    header: Option<&[String]>,
    field_count: usize,
) -> Result<(Vec<String>, NameSource)> {
    if let Some(path) = col_file {
        return Ok((read_column_file(path)?, NameSource::ColumnFile));
    }
    if let Some(fields) = header
        && !fields.is_empty()
    {
        return Ok((fields.to_vec(), NameSource::HeaderLine));
    }
    Ok((synthetic_names(field_count), NameSource::Synthetic))
}

/// Bracket-quote names with characters outside `[0-9A-Za-z_]`; prefix names
/// starting with a digit with `_`.
pub fn sql_column_name(name: &str) -> String {
    if needs_brackets_pattern().is_match(name) {
        format!("[{name}]")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// `schema.table` with the object part reduced to letters, digits and `_`.
pub fn sql_table_name(name: &str) -> String {
    let (schema, object) = match name.split_once('.') {
        Some((schema, object)) if !schema.is_empty() => (schema, object),
        Some((_, object)) => (DEFAULT_SCHEMA, object),
        None => (DEFAULT_SCHEMA, name),
    };
    let mut table = String::with_capacity(object.len() + 1);
    if !object.starts_with(|c: char| c == '_' || c.is_alphabetic()) {
        table.push('_');
    }
    table.extend(
        object
            .chars()
            .map(|c| if c == '_' || c.is_alphanumeric() { c } else { '_' }),
    );
    format!("{schema}.{table}")
}

/// Table name derived from the input file's stem.
pub fn default_table_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty() && stem != "-")
        .unwrap_or_else(|| "stdin".to_string());
    sql_table_name(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn column_names_are_made_sql_safe() {
        assert_eq!(sql_column_name("amount"), "amount");
        assert_eq!(sql_column_name("first name"), "[first name]");
        assert_eq!(sql_column_name("2nd_value"), "_2nd_value");
        assert_eq!(sql_column_name("2nd value"), "[2nd value]");
    }

    #[test]
    fn table_names_get_default_schema() {
        assert_eq!(sql_table_name("orders"), "dbo.orders");
        assert_eq!(sql_table_name("stage.2021 orders"), "stage._2021_orders");
        assert_eq!(sql_table_name("sales-data"), "dbo.sales_data");
    }

    #[test]
    fn default_table_name_uses_file_stem() {
        assert_eq!(default_table_name(&PathBuf::from("/data/zip-codes.txt")), "dbo.zip_codes");
        assert_eq!(default_table_name(&PathBuf::from("-")), "dbo.stdin");
    }

    #[test]
    fn header_beats_synthetic_names() {
        let header = vec!["id".to_string(), "name".to_string()];
        let (names, source) = resolve_column_names(None, Some(&header), 5).expect("names");
        assert_eq!(names, header);
        assert_eq!(source, NameSource::HeaderLine);

        let (names, source) = resolve_column_names(None, None, 3).expect("names");
        assert_eq!(names, vec!["col0", "col1", "col2"]);
        assert_eq!(source, NameSource::Synthetic);
    }

    #[test]
    fn column_file_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cols.txt");
        fs::write(&path, " id \n\nname\n").expect("write cols");
        let header = vec!["ignored".to_string()];
        let (names, source) =
            resolve_column_names(Some(&path), Some(&header), 1).expect("names");
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(source, NameSource::ColumnFile);
    }
}
