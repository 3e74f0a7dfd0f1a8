use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DelimiterSpec, FixedSpec};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile and prepare delimited or fixed-width files for bulk loading", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer SQL column types, lengths and value frequencies
    Profile(ProfileArgs),
    /// Preview the first few records in a formatted table
    Preview(PreviewArgs),
    /// Detect the field delimiter of a file
    Detect(DetectArgs),
    /// Write a tab-delimited, unquoted prep file ready for bulk loading
    Prep(PrepArgs),
}

/// Reader settings shared by every command. Each one overrides the matching
/// entry of `--config`.
#[derive(Debug, Clone, Default, Args)]
pub struct ReaderArgs {
    /// Input file, or '-' for stdin (stdin cannot be combined with delimiter or layout detection)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file with reader, split and profile settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Field delimiter: auto, tab, comma, pipe, semicolon or a single character
    #[arg(long)]
    pub delimiter: Option<DelimiterSpec>,
    /// Split on the delimiter without honoring quotes
    #[arg(long)]
    pub simple_parse: bool,
    /// Fixed-width layout: comma-separated column widths, or 'auto' to derive them
    #[arg(long)]
    pub fixed: Option<FixedSpec>,
    /// Spaces per tab when expanding fixed-width lines
    #[arg(long)]
    pub tab_size: Option<usize>,
    /// Leading lines to discard
    #[arg(long)]
    pub skip_lines: Option<usize>,
    /// 1-based line holding column names
    #[arg(long)]
    pub header_line: Option<usize>,
    /// Stop after this many records
    #[arg(long)]
    pub max_rows: Option<usize>,
    /// Stop reading at the first line starting with this text
    #[arg(long)]
    pub eof_str: Option<String>,
    /// File with one column name per line
    #[arg(long)]
    pub col_file: Option<PathBuf>,
    /// Split a code/description column, e.g. `state=:` (separator defaults to ':')
    #[arg(long = "split", action = clap::ArgAction::Append)]
    pub splits: Vec<String>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,
    /// Write the profile as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Write per-column value frequencies
    #[arg(long = "freq-file")]
    pub freq_file: Option<PathBuf>,
    /// Show the N most frequent values of each column
    #[arg(long)]
    pub top: Option<usize>,
    /// Print a CREATE TABLE statement for the profiled columns
    #[arg(long)]
    pub ddl: bool,
    /// Make every DDL column a padded varchar instead of its inferred type
    #[arg(long)]
    pub varchar: bool,
    /// Table name for the DDL (defaults to the input file name)
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,
    /// Number of records to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// File to sample
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PrepArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,
    /// Prep file destination (stdout when omitted or '-')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Profile while writing and log each column's inferred type
    #[arg(long)]
    pub profile: bool,
    /// Write the profile as JSON (implies --profile)
    #[arg(long)]
    pub report: Option<PathBuf>,
}
