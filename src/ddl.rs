//! `CREATE TABLE` generation from column profiles.

use std::fmt::Write as _;

use crate::{
    columns::sql_column_name,
    profile::{ColumnProfile, SqlType, VarCharLength},
};

/// Column type used when a column held no data.
const UNDETERMINED_TYPE: SqlType = SqlType::VarChar(VarCharLength::Max);

fn column_type(profile: &ColumnProfile, as_varchar: bool) -> SqlType {
    if as_varchar {
        SqlType::VarChar(profile.padded_length())
    } else {
        profile.padded_type().unwrap_or(UNDETERMINED_TYPE)
    }
}

/// Build a `create table` statement with types aligned on the longest column
/// name. `as_varchar` makes every column a padded varchar.
pub fn create_table_statement(columns: &[ColumnProfile], table: &str, as_varchar: bool) -> String {
    let names = columns
        .iter()
        .map(|profile| sql_column_name(profile.name()).to_lowercase())
        .collect::<Vec<_>>();
    let width = names.iter().map(|name| name.chars().count()).max().unwrap_or(0);

    let mut ddl = format!("create table {table}\n(\n");
    for (idx, (name, profile)) in names.iter().zip(columns).enumerate() {
        let lead = if idx == 0 { ' ' } else { ',' };
        let sql_type = column_type(profile, as_varchar);
        let _ = writeln!(ddl, "    {lead}{name:<width$} {sql_type}");
    }
    ddl.push_str(");");
    ddl
}
