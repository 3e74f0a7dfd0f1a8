//! Code/description column splitting.
//!
//! A value such as `MD:MARYLAND` in a column configured to split on `:` becomes
//! `MD` in the original column and `MARYLAND` in an inserted `<name>_descr`
//! column immediately to its right.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::{LoadError, LoadResult};

pub const DESCRIPTION_SUFFIX: &str = "_descr";
pub const DEFAULT_SEPARATOR: &str = ":";

/// Column ordinals (in the unsplit layout) mapped to their split strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSplitter {
    ordinals: BTreeMap<usize, String>,
}

impl ColumnSplitter {
    /// Match split definitions against `names`, returning the splitter and the
    /// expanded column list. An empty definition map disables splitting; a
    /// non-empty one that matches nothing is an error.
    pub fn plan(
        names: &[String],
        definitions: &BTreeMap<String, String>,
    ) -> LoadResult<(Self, Vec<String>)> {
        if definitions.is_empty() {
            return Ok((Self::default(), names.to_vec()));
        }
        let mut ordinals = BTreeMap::new();
        let mut expanded = Vec::with_capacity(names.len() + definitions.len());
        for (ordinal, name) in names.iter().enumerate() {
            expanded.push(name.clone());
            if let Some(separator) = definitions.get(name) {
                ordinals.insert(ordinal, separator.clone());
                expanded.push(format!("{name}{DESCRIPTION_SUFFIX}"));
            }
        }
        if ordinals.is_empty() {
            return Err(LoadError::ColumnSplit {
                names: definitions.keys().join(", "),
            });
        }
        Ok((Self { ordinals }, expanded))
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// Split the configured fields of one record; other fields pass through
    /// untouched.
    pub fn apply(&self, fields: Vec<String>) -> Vec<String> {
        if self.ordinals.is_empty() {
            return fields;
        }
        let mut split = Vec::with_capacity(fields.len() + self.ordinals.len());
        for (ordinal, field) in fields.into_iter().enumerate() {
            match self.ordinals.get(&ordinal) {
                Some(separator) => {
                    let (code, description) = split_code_description(&field, separator);
                    split.push(code);
                    split.push(description);
                }
                None => split.push(field),
            }
        }
        split
    }
}

/// Split on the first occurrence of `separator`. Without one, the value stays
/// whole and the description is empty.
pub fn split_code_description(value: &str, separator: &str) -> (String, String) {
    match value.split_once(separator) {
        Some((code, description)) => (code.trim().to_string(), description.trim().to_string()),
        None => (value.to_string(), String::new()),
    }
}
