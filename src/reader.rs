//! Record reader: one "read next record" operation over a flat file.
//!
//! [`RecordReader`] pulls physical lines from a UTF-8 line source, rebuilds
//! logical lines (delimited input only: a line with an odd number of double
//! quotes continues on the next physical line), applies skip-lines, max-rows
//! and the end-of-file marker, and hands surviving lines to a [`LineSplitter`].
//!
//! Stopping is one-way: once max-rows is reached, the marker is seen or the
//! input ends, every later call returns `Ok(None)`.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use log::{debug, info};
use serde::Serialize;

use crate::{
    config::{DelimiterSpec, FixedSpec, ReaderConfig},
    delimited::{self, DelimitedLineParser},
    delimiter,
    error::{LoadError, LoadResult},
    fixed_width::{
        BoundarySource, DerivedFromSample, ExplicitWidths, FieldBoundaryTable, Parseability,
        expand_tabs,
    },
    io_utils,
};

/// Bytes credited per line terminator, as if the source were CRLF-terminated.
const LINE_TERMINATOR_BYTES: u64 = 2;

/// How one logical line becomes fields.
#[derive(Debug, Clone)]
pub enum LineSplitter {
    Delimited(DelimitedLineParser),
    FixedWidth {
        table: FieldBoundaryTable,
        parseability: Parseability,
        tab_size: usize,
    },
}

impl LineSplitter {
    /// Build the splitter `config` describes, running delimiter detection or
    /// fixed-width derivation against `path` when needed.
    pub fn from_config(
        path: &Path,
        config: &ReaderConfig,
        encoding: &'static Encoding,
    ) -> LoadResult<Self> {
        match &config.fixed {
            Some(spec) => {
                let (table, parseability) = match spec {
                    FixedSpec::Widths(widths) => ExplicitWidths(widths.clone()).resolve()?,
                    FixedSpec::Auto => DerivedFromSample {
                        path: path.to_path_buf(),
                        tab_size: config.tab_size,
                        encoding,
                    }
                    .resolve()?,
                };
                debug!(
                    "Fixed-width layout for {:?}: {} column(s) starting at {:?}",
                    path,
                    table.column_count(),
                    table.column_starts()
                );
                Ok(LineSplitter::FixedWidth {
                    table,
                    parseability,
                    tab_size: config.tab_size,
                })
            }
            None => {
                let delimiter = match config.delimiter {
                    DelimiterSpec::Char(byte) => byte,
                    DelimiterSpec::Auto => {
                        let detected = delimiter::detect_delimiter_in_path(path, encoding)?;
                        info!(
                            "Obtained delimiter from file: {}",
                            io_utils::printable_delimiter(detected)
                        );
                        detected
                    }
                };
                Ok(LineSplitter::Delimited(
                    DelimitedLineParser::new(delimiter, config.simple_parse)
                        .with_embedded_tab_removal(config.remove_embedded_tabs),
                ))
            }
        }
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self, LineSplitter::Delimited(_))
    }

    /// Fixed-width layouts know their width up front; delimited ones do not.
    pub fn column_count(&self) -> Option<usize> {
        match self {
            LineSplitter::Delimited(_) => None,
            LineSplitter::FixedWidth { table, .. } => Some(table.column_count()),
        }
    }

    pub fn split(&self, line: &str) -> Vec<String> {
        match self {
            LineSplitter::Delimited(parser) => parser.split_line(line),
            LineSplitter::FixedWidth {
                table, tab_size, ..
            } => table.split_line(expand_tabs(line, *tab_size).trim_end()),
        }
    }
}

/// Progress counters for one reading session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderSession {
    /// Physical lines pulled from the source, skipped ones included.
    pub lines_read: usize,
    pub lines_skipped: usize,
    /// Records returned to the caller.
    pub rows_processed: usize,
    pub bytes_read: u64,
}

pub struct RecordReader<R> {
    source: R,
    splitter: LineSplitter,
    origin: PathBuf,
    lines_to_skip: usize,
    header_line: usize,
    header: Option<Vec<String>>,
    max_rows: Option<usize>,
    eof_marker: Option<String>,
    session: ReaderSession,
    finished: bool,
}

impl RecordReader<Box<dyn BufRead>> {
    /// Open `path` (or stdin for `-`) using `config`. Delimiter detection and
    /// fixed-width derivation each read the file once more before this returns.
    pub fn open(path: &Path, config: &ReaderConfig) -> anyhow::Result<Self> {
        let encoding = config.resolved_encoding()?;
        let splitter = LineSplitter::from_config(path, config, encoding)?;
        let source = io_utils::open_input(path, encoding)?;
        Ok(Self::new(source, splitter, config).with_origin(path))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(source: R, splitter: LineSplitter, config: &ReaderConfig) -> Self {
        Self {
            source,
            splitter,
            origin: PathBuf::from("-"),
            lines_to_skip: config.lines_to_skip(),
            header_line: config.header_line,
            header: None,
            max_rows: config.max_rows,
            eof_marker: config.eof_marker().map(str::to_string),
            session: ReaderSession::default(),
            finished: false,
        }
    }

    pub fn with_origin(mut self, path: &Path) -> Self {
        self.origin = path.to_path_buf();
        self
    }

    pub fn splitter(&self) -> &LineSplitter {
        &self.splitter
    }

    pub fn session(&self) -> &ReaderSession {
        &self.session
    }

    /// Fields of the configured header line, once reading has passed it.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn is_parseable(&self) -> bool {
        !matches!(
            self.splitter,
            LineSplitter::FixedWidth {
                parseability: Parseability::NotParseable { .. },
                ..
            }
        )
    }

    /// Next record's fields, or `None` once reading has stopped for good.
    pub fn read_next(&mut self) -> LoadResult<Option<Vec<String>>> {
        if let LineSplitter::FixedWidth {
            parseability: Parseability::NotParseable { line, offset },
            ..
        } = &self.splitter
        {
            return Err(LoadError::NotParseable {
                path: self.origin.clone(),
                line: *line,
                offset: *offset,
            });
        }
        if self.finished {
            return Ok(None);
        }
        loop {
            if let Some(max_rows) = self.max_rows
                && self.session.rows_processed >= max_rows
            {
                return Ok(self.finish());
            }
            let Some(line) = self.next_logical_line()? else {
                return Ok(self.finish());
            };
            if self.session.lines_skipped < self.lines_to_skip {
                self.session.lines_skipped += 1;
                if self.session.lines_skipped == self.header_line {
                    self.header = Some(self.splitter.split(&line));
                }
                continue;
            }
            if let Some(marker) = &self.eof_marker
                && line.starts_with(marker.as_str())
            {
                debug!("End-of-file marker found after {} row(s)", self.session.rows_processed);
                return Ok(self.finish());
            }
            self.session.rows_processed += 1;
            return Ok(Some(self.splitter.split(&line)));
        }
    }

    fn finish(&mut self) -> Option<Vec<String>> {
        self.finished = true;
        None
    }

    fn next_physical_line(&mut self) -> LoadResult<Option<String>> {
        let mut line = String::new();
        if self.source.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.session.lines_read += 1;
        self.session.bytes_read += line.len() as u64 + LINE_TERMINATOR_BYTES;
        Ok(Some(line))
    }

    fn next_logical_line(&mut self) -> LoadResult<Option<String>> {
        let Some(mut line) = self.next_physical_line()? else {
            return Ok(None);
        };
        if !self.splitter.is_delimited() {
            return Ok(Some(line));
        }
        let mut quotes = delimited::quote_count(&line);
        while quotes % 2 != 0 {
            let Some(continuation) = self.next_physical_line()? else {
                break;
            };
            quotes += delimited::quote_count(&continuation);
            line.push('\n');
            line.push_str(&continuation);
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = LoadResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
