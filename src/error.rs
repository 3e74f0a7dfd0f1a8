use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for reader and detector operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Failures the parsing core reports to its caller.
///
/// None of these are retried internally; each one is deterministic for a given
/// input and configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O error (missing file, permission denied, broken pipe).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A fixed-width file whose lines disagree with the derived column boundaries.
    #[error(
        "{path:?} does not exhibit a consistent fixed-width format (line {line} has no space before offset {offset})"
    )]
    NotParseable {
        path: PathBuf,
        line: usize,
        offset: usize,
    },

    /// No candidate delimiter reached the consistency threshold.
    #[error("unable to determine the delimiter of {path:?} from its data")]
    DelimiterUndetermined { path: PathBuf },

    /// An explicit fixed-width column list contained an unusable width.
    #[error("fixed-width column {index} has invalid width {width}")]
    InvalidWidth { index: usize, width: usize },

    /// A multi-pass operation was requested on a stream that can only be read once.
    #[error("{operation} requires a file path; stdin can only be read once")]
    StdinNotSeekable { operation: &'static str },

    /// A column split definition did not match any column.
    #[error("column split definition matched no columns: {names}")]
    ColumnSplit { names: String },
}
