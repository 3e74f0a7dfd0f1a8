//! Delimiter detection from a sample of the input.
//!
//! Each candidate (tab, pipe, comma, in that priority order) naively splits the
//! first [`SAMPLE_LINES`] lines. A candidate is accepted when one field count
//! greater than one covers more than [`LIKELY_THRESHOLD`] of the sampled lines.

use std::{io::BufRead, path::Path};

use encoding_rs::Encoding;
use itertools::Itertools;
use log::debug;

use crate::{
    error::{LoadError, LoadResult},
    io_utils,
};

pub const SAMPLE_LINES: usize = 1000;
pub const CANDIDATES: [u8; 3] = [b'\t', b'|', b','];
const LIKELY_THRESHOLD: f64 = 0.95;

/// Fraction of lines whose field count equals the most common count. Counts of
/// one (delimiter absent) never form the mode.
pub fn modal_fit_ratio(field_counts: &[usize]) -> f64 {
    if field_counts.is_empty() {
        return 0.0;
    }
    let modal = field_counts
        .iter()
        .filter(|&&count| count > 1)
        .counts()
        .into_values()
        .max()
        .unwrap_or(0);
    modal as f64 / field_counts.len() as f64
}

/// Guess the delimiter from up to [`SAMPLE_LINES`] lines of `reader`.
pub fn detect_delimiter<R: BufRead>(reader: R) -> LoadResult<Option<u8>> {
    let sample = reader
        .lines()
        .take(SAMPLE_LINES)
        .collect::<Result<Vec<_>, _>>()?;

    for candidate in CANDIDATES {
        let counts = sample
            .iter()
            .map(|line| line.split(candidate as char).count())
            .collect::<Vec<_>>();
        let ratio = modal_fit_ratio(&counts);
        debug!(
            "Delimiter candidate '{}' modal fit ratio {ratio:.3} over {} line(s)",
            io_utils::printable_delimiter(candidate),
            sample.len()
        );
        if ratio > LIKELY_THRESHOLD {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Detect the delimiter of the file at `path`; failing to find one is an error.
pub fn detect_delimiter_in_path(path: &Path, encoding: &'static Encoding) -> LoadResult<u8> {
    if io_utils::is_dash(path) {
        return Err(LoadError::StdinNotSeekable {
            operation: "delimiter detection",
        });
    }
    let reader = io_utils::open_decoded_file(path, encoding)?;
    detect_delimiter(reader)?.ok_or_else(|| LoadError::DelimiterUndetermined {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn modal_ratio_ignores_single_field_lines() {
        assert_eq!(modal_fit_ratio(&[1, 1, 1, 1]), 0.0);
        assert_eq!(modal_fit_ratio(&[3, 3, 3, 2]), 0.75);
        assert_eq!(modal_fit_ratio(&[]), 0.0);
    }

    #[test]
    fn comma_file_is_detected() {
        let text = "a,b,c\n1,2,3\n4,5,6\n";
        assert_eq!(detect_delimiter(Cursor::new(text)).expect("detect"), Some(b','));
    }

    #[test]
    fn tab_wins_over_pipe_when_both_are_consistent() {
        let text = "a\tb|c\n1\t2|3\n";
        assert_eq!(detect_delimiter(Cursor::new(text)).expect("detect"), Some(b'\t'));
    }

    #[test]
    fn inconsistent_counts_yield_none() {
        let text = "a,b\nc,d,e\nf\ng,h,i,j\n";
        assert_eq!(detect_delimiter(Cursor::new(text)).expect("detect"), None);
    }

    #[test]
    fn exactly_ninety_five_percent_is_not_enough() {
        let mut text = String::new();
        for _ in 0..95 {
            text.push_str("a|b\n");
        }
        for _ in 0..5 {
            text.push_str("a|b|c\n");
        }
        assert_eq!(detect_delimiter(Cursor::new(text)).expect("detect"), None);
    }
}
