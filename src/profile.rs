//! Per-column type inference.
//!
//! Every non-empty value observed for a column is classified as numeric
//! (32-bit, 64-bit and decimal ranges tracked separately), date/time, or
//! character. The final SQL type is the narrowest one that matched every single
//! observation. Character is absorbing: once a column sees a value that is not
//! numeric and not a date, it stays character for the rest of the pass.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::BufWriter,
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// Distinct lower-cased values tracked per column.
pub const FREQUENCY_CAP: usize = 1000;
/// Values longer than this are character without attempting typed parses.
const TYPED_VALUE_MAX_CHARS: usize = 30;
const MAX_NUMERIC_PRECISION: u32 = 38;
const PAD_FACTOR_TENTHS: usize = 16;
const VARCHAR_BUCKETS: [usize; 9] = [20, 50, 100, 255, 500, 1000, 2000, 3000, 4000];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d-%b-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%B %d, %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

fn earliest_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1763, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Derive typed columns; when false every column is varchar.
    pub typed: bool,
    /// Keep per-column frequency tables in the report.
    pub frequencies: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            typed: true,
            frequencies: false,
        }
    }
}

/// Last successful classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParseKind {
    #[default]
    Uninitialized,
    Numeric,
    DateTime,
    Character,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarCharLength {
    Sized(usize),
    Max,
}

impl fmt::Display for VarCharLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarCharLength::Sized(length) => write!(f, "{length}"),
            VarCharLength::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    BigInt,
    Numeric { precision: u32, scale: u32 },
    DateTime,
    VarChar(VarCharLength),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Int => write!(f, "int"),
            SqlType::BigInt => write!(f, "bigint"),
            SqlType::Numeric { precision, scale } => write!(f, "numeric({precision},{scale})"),
            SqlType::DateTime => write!(f, "datetime"),
            SqlType::VarChar(length) => write!(f, "varchar({length})"),
        }
    }
}

impl Serialize for SqlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bucket a maximum length, scaled by 1.6, into the varchar sizes used for
/// generated tables.
pub fn pad_length(max_len: usize) -> VarCharLength {
    let padded = max_len * PAD_FACTOR_TENTHS / 10;
    VARCHAR_BUCKETS
        .iter()
        .find(|&&bucket| padded < bucket)
        .map_or(VarCharLength::Max, |&bucket| VarCharLength::Sized(bucket))
}

/// Values containing anything but digits, signs and a decimal point are not
/// handed to the numeric parsers.
///
/// Grouping separators are deliberately rejected: `1,234` profiles as
/// character, because a bulk load of that text into a numeric column fails.
fn looks_numeric(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit())
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
}

fn count_digits(mut magnitude: u128) -> u32 {
    let mut digits = 0;
    while magnitude > 0 {
        digits += 1;
        magnitude /= 10;
    }
    digits
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(NaiveTime::default()))
        })
        .or_else(|| {
            TIME_FORMATS
                .iter()
                .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
                .and_then(|time| NaiveDate::from_ymd_opt(1900, 1, 1).map(|date| date.and_time(time)))
        })
}

/// True when `value` is a calendar date or time the target datetime type can
/// store.
pub fn is_storable_datetime(value: &str) -> bool {
    parse_datetime(value).is_some_and(|parsed| parsed >= earliest_datetime())
}

#[derive(Debug, Clone)]
pub struct ColumnProfile {
    name: String,
    options: ProfileOptions,
    max_len: usize,
    non_empty: usize,
    int_parses: usize,
    bigint_parses: usize,
    decimal_parses: usize,
    datetime_parses: usize,
    character_parses: usize,
    max_precision: u32,
    max_scale: u32,
    max_integer_digits: u32,
    last_kind: ParseKind,
    frequencies: HashMap<String, usize>,
}

impl ColumnProfile {
    pub fn new(name: impl Into<String>, options: ProfileOptions) -> Self {
        Self {
            name: name.into(),
            options,
            max_len: 0,
            non_empty: 0,
            int_parses: 0,
            bigint_parses: 0,
            decimal_parses: 0,
            datetime_parses: 0,
            character_parses: 0,
            max_precision: 0,
            max_scale: 0,
            max_integer_digits: 0,
            last_kind: ParseKind::Uninitialized,
            frequencies: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn non_empty(&self) -> usize {
        self.non_empty
    }

    pub fn frequencies(&self) -> &HashMap<String, usize> {
        &self.frequencies
    }

    pub fn is_character(&self) -> bool {
        self.character_parses > 0
    }

    pub fn observe(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        let length = value.chars().count();
        self.non_empty += 1;
        self.max_len = self.max_len.max(length);
        if self.options.typed {
            self.classify(value, length);
        }
        self.tally(value);
    }

    fn tally(&mut self, value: &str) {
        let key = value.to_lowercase();
        if let Some(count) = self.frequencies.get_mut(&key) {
            *count += 1;
        } else if self.frequencies.len() < FREQUENCY_CAP {
            self.frequencies.insert(key, 1);
        }
    }

    fn classify(&mut self, value: &str, length: usize) {
        if self.last_kind == ParseKind::Character || length > TYPED_VALUE_MAX_CHARS {
            self.mark_character();
            return;
        }
        let tried_first = self.last_kind;
        match tried_first {
            ParseKind::Numeric if self.parse_numeric(value) => return,
            ParseKind::DateTime if self.parse_datetime(value) => return,
            _ => {}
        }
        if tried_first != ParseKind::Numeric && self.parse_numeric(value) {
            return;
        }
        if tried_first != ParseKind::DateTime && self.parse_datetime(value) {
            return;
        }
        self.mark_character();
    }

    fn mark_character(&mut self) {
        self.character_parses += 1;
        self.last_kind = ParseKind::Character;
    }

    fn parse_numeric(&mut self, value: &str) -> bool {
        if !looks_numeric(value) {
            return false;
        }
        let mut parsed = false;
        if value.parse::<i32>().is_ok() {
            self.int_parses += 1;
            parsed = true;
        }
        if value.parse::<i64>().is_ok() {
            self.bigint_parses += 1;
            parsed = true;
        }
        if let Ok(decimal) = Decimal::from_str(value) {
            self.decimal_parses += 1;
            let precision = count_digits(decimal.mantissa().unsigned_abs());
            let scale = if decimal.is_zero() { 0 } else { decimal.scale() };
            self.max_precision = self.max_precision.max(precision);
            self.max_scale = self.max_scale.max(scale);
            self.max_integer_digits = self
                .max_integer_digits
                .max(precision.saturating_sub(scale));
            parsed = true;
        }
        if parsed {
            self.last_kind = ParseKind::Numeric;
        }
        parsed
    }

    fn parse_datetime(&mut self, value: &str) -> bool {
        if is_storable_datetime(value) {
            self.datetime_parses += 1;
            self.last_kind = ParseKind::DateTime;
            true
        } else {
            false
        }
    }

    fn numeric_type(&self) -> Option<SqlType> {
        if self.max_precision == 0 && self.max_scale == 0 {
            return Some(SqlType::Numeric {
                precision: 1,
                scale: 0,
            });
        }
        let precision = self
            .max_precision
            .max(self.max_integer_digits + self.max_scale);
        (precision <= MAX_NUMERIC_PRECISION).then_some(SqlType::Numeric {
            precision,
            scale: self.max_scale,
        })
    }

    fn derive_type(&self, length: VarCharLength) -> Option<SqlType> {
        if self.non_empty == 0 {
            return None;
        }
        if self.options.typed {
            let every = |count: usize| count == self.non_empty;
            if every(self.int_parses) {
                return Some(SqlType::Int);
            }
            if every(self.bigint_parses) {
                return Some(SqlType::BigInt);
            }
            if every(self.decimal_parses)
                && let Some(numeric) = self.numeric_type()
            {
                return Some(numeric);
            }
            if every(self.datetime_parses) {
                return Some(SqlType::DateTime);
            }
        }
        Some(SqlType::VarChar(length))
    }

    /// Narrowest type matching every observation, with varchar lengths taken
    /// as observed. `None` when the column held no non-empty value.
    pub fn final_type(&self) -> Option<SqlType> {
        self.derive_type(VarCharLength::Sized(self.max_len))
    }

    /// Like [`final_type`](Self::final_type) but with padded varchar lengths.
    pub fn padded_type(&self) -> Option<SqlType> {
        self.derive_type(self.padded_length())
    }

    pub fn padded_length(&self) -> VarCharLength {
        pad_length(self.max_len)
    }
}

/// Profiles for every column of one pass.
#[derive(Debug, Clone)]
pub struct Profiler {
    columns: Vec<ColumnProfile>,
    records: usize,
}

impl Profiler {
    pub fn new(names: &[String], options: ProfileOptions) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| ColumnProfile::new(name.as_str(), options))
                .collect(),
            records: 0,
        }
    }

    /// Observe one value; indexes past the known columns are ignored.
    pub fn observe(&mut self, column: usize, value: &str) {
        if let Some(profile) = self.columns.get_mut(column) {
            profile.observe(value);
        }
    }

    pub fn observe_record(&mut self, fields: &[String]) {
        self.records += 1;
        for (column, value) in fields.iter().enumerate() {
            self.observe(column, value);
        }
    }

    pub fn final_type(&self, column: usize) -> Option<SqlType> {
        self.columns.get(column).and_then(ColumnProfile::final_type)
    }

    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn report(&self, include_frequencies: bool) -> ProfileReport {
        ProfileReport {
            records: self.records,
            columns: self
                .columns
                .iter()
                .map(|profile| ColumnReport::from_profile(profile, include_frequencies))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub sql_type: Option<SqlType>,
    pub padded_type: Option<SqlType>,
    pub max_length: usize,
    pub non_empty: usize,
    pub distinct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<Vec<(String, usize)>>,
}

impl ColumnReport {
    fn from_profile(profile: &ColumnProfile, include_frequencies: bool) -> Self {
        Self {
            name: profile.name().to_string(),
            sql_type: profile.final_type(),
            padded_type: profile.padded_type(),
            max_length: profile.max_len(),
            non_empty: profile.non_empty(),
            distinct: profile.frequencies().len(),
            frequencies: include_frequencies.then(|| sorted_frequencies(profile)),
        }
    }
}

/// Frequency entries ordered by value.
pub fn sorted_frequencies(profile: &ColumnProfile) -> Vec<(String, usize)> {
    let mut entries = profile
        .frequencies()
        .iter()
        .map(|(value, count)| (value.clone(), *count))
        .collect::<Vec<_>>();
    entries.sort();
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub records: usize,
    pub columns: Vec<ColumnReport>,
}

impl ProfileReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).context("Writing profile report JSON")
    }
}
