//! Reader and profiling configuration.
//!
//! A [`LoadConfig`] is built once per run, optionally from a YAML file, then
//! overridden by command-line arguments, and passed by reference into the
//! record reader and profiler constructors.

use std::{collections::BTreeMap, fmt, path::{Path, PathBuf}, str::FromStr};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{cli::ReaderArgs, io_utils, profile::ProfileOptions, split};

pub const DEFAULT_TAB_SIZE: usize = 4;

/// Field delimiter, or a request to detect it from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DelimiterSpec {
    #[default]
    Auto,
    Char(u8),
}

impl FromStr for DelimiterSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(DelimiterSpec::Auto),
            "tab" | "\t" => Ok(DelimiterSpec::Char(b'\t')),
            "comma" | "," => Ok(DelimiterSpec::Char(b',')),
            "pipe" | "|" => Ok(DelimiterSpec::Char(b'|')),
            "semicolon" | ";" => Ok(DelimiterSpec::Char(b';')),
            other => {
                let mut chars = other.chars();
                let first = chars
                    .next()
                    .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
                if chars.next().is_some() {
                    return Err(format!(
                        "Delimiter must be a single character or one of auto, tab, comma, pipe (got '{other}')"
                    ));
                }
                if !first.is_ascii() || first == '"' {
                    return Err("Delimiter must be an ASCII character other than '\"'".to_string());
                }
                Ok(DelimiterSpec::Char(first as u8))
            }
        }
    }
}

impl TryFrom<String> for DelimiterSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DelimiterSpec> for String {
    fn from(spec: DelimiterSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for DelimiterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelimiterSpec::Auto => write!(f, "auto"),
            DelimiterSpec::Char(byte) => write!(f, "{}", io_utils::printable_delimiter(*byte)),
        }
    }
}

const EMPTY_LAYOUT: &str = "Fixed-width layout requires 'auto' or a list of widths";

/// Fixed-width layout: explicit column widths, or derived from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FixedRepr", into = "FixedRepr")]
pub enum FixedSpec {
    Auto,
    Widths(Vec<usize>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FixedRepr {
    Widths(Vec<usize>),
    Keyword(String),
}

impl TryFrom<FixedRepr> for FixedSpec {
    type Error = String;

    fn try_from(repr: FixedRepr) -> Result<Self, Self::Error> {
        match repr {
            FixedRepr::Widths(widths) if widths.is_empty() => Err(EMPTY_LAYOUT.to_string()),
            FixedRepr::Widths(widths) => Ok(FixedSpec::Widths(widths)),
            FixedRepr::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<FixedSpec> for FixedRepr {
    fn from(spec: FixedSpec) -> Self {
        match spec {
            FixedSpec::Auto => FixedRepr::Keyword("auto".to_string()),
            FixedSpec::Widths(widths) => FixedRepr::Widths(widths),
        }
    }
}

impl FromStr for FixedSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(FixedSpec::Auto);
        }
        let widths = trimmed
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid fixed-width column width '{token}'"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if widths.is_empty() {
            return Err(EMPTY_LAYOUT.to_string());
        }
        Ok(FixedSpec::Widths(widths))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub delimiter: DelimiterSpec,
    pub simple_parse: bool,
    pub fixed: Option<FixedSpec>,
    pub tab_size: usize,
    pub skip_lines: usize,
    /// 1-based line holding column names; 0 means none.
    pub header_line: usize,
    pub max_rows: Option<usize>,
    pub eof_str: Option<String>,
    pub remove_embedded_tabs: bool,
    pub encoding: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: DelimiterSpec::Auto,
            simple_parse: false,
            fixed: None,
            tab_size: DEFAULT_TAB_SIZE,
            skip_lines: 0,
            header_line: 0,
            max_rows: None,
            eof_str: None,
            remove_embedded_tabs: false,
            encoding: None,
        }
    }
}

impl ReaderConfig {
    pub fn is_fixed_width(&self) -> bool {
        self.fixed.is_some()
    }

    /// Leading lines the reader discards; the header line is never data.
    pub fn lines_to_skip(&self) -> usize {
        self.skip_lines.max(self.header_line)
    }

    pub fn eof_marker(&self) -> Option<&str> {
        self.eof_str.as_deref().filter(|marker| !marker.is_empty())
    }

    pub fn resolved_encoding(&self) -> Result<&'static Encoding> {
        io_utils::resolve_encoding(self.encoding.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    #[serde(flatten)]
    pub reader: ReaderConfig,
    /// File holding one column name per line.
    pub col_file: Option<PathBuf>,
    /// Column name -> split string for code/description columns.
    pub splits: BTreeMap<String, String>,
    pub profile: ProfileOptions,
}

impl LoadConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    /// Config file (if any) with command-line overrides applied on top.
    pub fn from_args(args: &ReaderArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, args: &ReaderArgs) -> Result<()> {
        let reader = &mut self.reader;
        if let Some(delimiter) = args.delimiter {
            reader.delimiter = delimiter;
        }
        if args.simple_parse {
            reader.simple_parse = true;
        }
        if let Some(fixed) = &args.fixed {
            reader.fixed = Some(fixed.clone());
        }
        if let Some(tab_size) = args.tab_size {
            reader.tab_size = tab_size;
        }
        if let Some(skip_lines) = args.skip_lines {
            reader.skip_lines = skip_lines;
        }
        if let Some(header_line) = args.header_line {
            reader.header_line = header_line;
        }
        if let Some(max_rows) = args.max_rows {
            reader.max_rows = Some(max_rows);
        }
        if let Some(eof_str) = &args.eof_str {
            reader.eof_str = Some(eof_str.clone());
        }
        if let Some(encoding) = &args.input_encoding {
            reader.encoding = Some(encoding.clone());
        }
        if let Some(col_file) = &args.col_file {
            self.col_file = Some(col_file.clone());
        }
        for definition in &args.splits {
            let (name, separator) = parse_split_definition(definition)?;
            self.splits.insert(name, separator);
        }
        if reader.tab_size == 0 {
            bail!("Tab size must be at least 1");
        }
        Ok(())
    }
}

/// `name=separator`, or a bare `name` splitting on the default separator.
fn parse_split_definition(definition: &str) -> Result<(String, String)> {
    let (name, separator) = definition
        .split_once('=')
        .unwrap_or((definition, split::DEFAULT_SEPARATOR));
    let name = name.trim();
    if name.is_empty() || separator.is_empty() {
        bail!("Split definition '{definition}' needs both a column name and a separator");
    }
    Ok((name.to_string(), separator.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_spec_accepts_names_and_characters() {
        assert_eq!("auto".parse(), Ok(DelimiterSpec::Auto));
        assert_eq!("tab".parse(), Ok(DelimiterSpec::Char(b'\t')));
        assert_eq!("|".parse(), Ok(DelimiterSpec::Char(b'|')));
        assert!("::".parse::<DelimiterSpec>().is_err());
        assert!("\"".parse::<DelimiterSpec>().is_err());
    }

    #[test]
    fn fixed_spec_parses_widths_and_auto() {
        assert_eq!("AUTO".parse(), Ok(FixedSpec::Auto));
        assert_eq!("3, 5,2".parse(), Ok(FixedSpec::Widths(vec![3, 5, 2])));
        assert!("3,x".parse::<FixedSpec>().is_err());
    }

    #[test]
    fn yaml_config_fills_defaults() {
        let yaml = "delimiter: pipe\nfixed: [2, 4]\nskip_lines: 1\nheader_line: 2\nsplits:\n  state: ':'\nprofile:\n  frequencies: true\n";
        let config: LoadConfig = serde_yaml::from_str(yaml).expect("parse yaml");
        assert_eq!(config.reader.delimiter, DelimiterSpec::Char(b'|'));
        assert_eq!(config.reader.fixed, Some(FixedSpec::Widths(vec![2, 4])));
        assert_eq!(config.reader.tab_size, DEFAULT_TAB_SIZE);
        assert_eq!(config.reader.lines_to_skip(), 2);
        assert_eq!(config.splits.get("state").map(String::as_str), Some(":"));
        assert!(config.profile.frequencies);
        assert!(config.profile.typed);
    }

    #[test]
    fn yaml_fixed_auto_keyword() {
        let config: LoadConfig = serde_yaml::from_str("fixed: auto\n").expect("parse yaml");
        assert_eq!(config.reader.fixed, Some(FixedSpec::Auto));
    }

    #[test]
    fn empty_width_list_is_rejected() {
        let err = serde_yaml::from_str::<LoadConfig>("fixed: []
").unwrap_err();
        assert!(err.to_string().contains("requires 'auto' or a list of widths"));
        assert!("".parse::<FixedSpec>().is_err());
    }

    #[test]
    fn empty_eof_marker_is_ignored() {
        let config = ReaderConfig {
            eof_str: Some(String::new()),
            ..ReaderConfig::default()
        };
        assert_eq!(config.eof_marker(), None);
    }

    #[test]
    fn split_definition_defaults_to_colon() {
        assert_eq!(
            parse_split_definition("code").expect("split"),
            ("code".to_string(), ":".to_string())
        );
        assert!(parse_split_definition("code=").is_err());
        assert_eq!(
            parse_split_definition("code=:").expect("split"),
            ("code".to_string(), ":".to_string())
        );
    }
}
