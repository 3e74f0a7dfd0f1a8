//! One sequential pass over a flat file.
//!
//! [`ColumnStream`] wraps a [`RecordReader`], resolves column names once the
//! header (if any) has been read, and applies code/description splitting to
//! every record. [`run_pass`] drains a stream into the profiler and, when asked,
//! into a prep file.

use std::{
    borrow::Cow,
    io::{BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::{
    columns::{self, NameSource},
    config::{LoadConfig, ReaderConfig},
    io_utils,
    profile::Profiler,
    reader::{LineSplitter, ReaderSession, RecordReader},
    split::ColumnSplitter,
};

pub const PROGRESS_INTERVAL: usize = 100_000;

/// Records of one input with their resolved, split-expanded column names.
pub struct ColumnStream<R> {
    reader: RecordReader<R>,
    pending: Option<Vec<String>>,
    columns: Vec<String>,
    name_source: NameSource,
    splitter: ColumnSplitter,
}

impl ColumnStream<Box<dyn BufRead>> {
    pub fn open(input: &Path, config: &LoadConfig, reader_config: &ReaderConfig) -> Result<Self> {
        let reader = RecordReader::open(input, reader_config)
            .with_context(|| format!("Opening reader for {input:?}"))?;
        info!("Reading {:?} as {}", input, describe_layout(reader.splitter()));
        Self::from_reader(reader, config).with_context(|| format!("Reading {input:?}"))
    }
}

impl<R: BufRead> ColumnStream<R> {
    /// Reads the first record so the column count is known for synthetic names.
    pub fn from_reader(mut reader: RecordReader<R>, config: &LoadConfig) -> Result<Self> {
        let pending = reader.read_next()?;
        let field_count = pending
            .as_ref()
            .map(Vec::len)
            .or_else(|| reader.splitter().column_count())
            .unwrap_or(0);
        let (names, name_source) =
            columns::resolve_column_names(config.col_file.as_deref(), reader.header(), field_count)?;
        let (splitter, columns) = ColumnSplitter::plan(&names, &config.splits)?;
        debug!("Column names ({name_source:?}): {columns:?}");
        Ok(Self {
            reader,
            pending,
            columns,
            name_source,
            splitter,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn name_source(&self) -> NameSource {
        self.name_source
    }

    pub fn session(&self) -> &ReaderSession {
        self.reader.session()
    }

    /// Next split record, padded with empty fields to the column count.
    pub fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        let fields = match self.pending.take() {
            Some(fields) => fields,
            None => match self.reader.read_next()? {
                Some(fields) => fields,
                None => return Ok(None),
            },
        };
        let mut fields = self.splitter.apply(fields);
        if fields.len() < self.columns.len() {
            fields.resize(self.columns.len(), String::new());
        }
        Ok(Some(fields))
    }
}

pub fn describe_layout(splitter: &LineSplitter) -> String {
    match splitter {
        LineSplitter::Delimited(parser) => format!(
            "delimited text (delimiter '{}')",
            io_utils::printable_delimiter(parser.delimiter())
        ),
        LineSplitter::FixedWidth { table, .. } => {
            format!("fixed-width text ({} column(s))", table.column_count())
        }
    }
}

/// Prep files hold one record per line, so embedded line breaks become spaces.
fn single_line(field: &str) -> Cow<'_, str> {
    if field.contains(['\n', '\r']) {
        Cow::Owned(field.replace("\r\n", " ").replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(field)
    }
}

/// Counters reported after a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub lines_read: usize,
    pub rows_processed: usize,
    pub bytes_read: u64,
    pub records_written: usize,
}

#[derive(Debug)]
pub struct PassOutcome {
    pub summary: PassSummary,
    pub columns: Vec<String>,
    pub profiler: Option<Profiler>,
}

/// Reader settings for a pass; prep output never carries embedded tabs.
pub fn pass_reader_config(config: &LoadConfig, writes_prep: bool) -> ReaderConfig {
    let mut reader = config.reader.clone();
    if writes_prep {
        reader.remove_embedded_tabs = true;
    }
    reader
}

/// Drain `stream`, profiling when `profile` is set and writing every record to
/// `prep` when given.
pub fn run_pass<R, W>(
    mut stream: ColumnStream<R>,
    config: &LoadConfig,
    profile: bool,
    mut prep: Option<&mut csv::Writer<W>>,
) -> Result<PassOutcome>
where
    R: BufRead,
    W: Write,
{
    let mut profiler = profile.then(|| Profiler::new(stream.columns(), config.profile));
    let mut records_written = 0usize;

    while let Some(fields) = stream.next_record()? {
        if let Some(profiler) = profiler.as_mut() {
            profiler.observe_record(&fields);
        }
        if let Some(writer) = prep.as_deref_mut() {
            let line = fields.iter().map(|field| single_line(field)).collect::<Vec<_>>();
            writer
                .write_record(line.iter().map(|field| field.as_bytes()))
                .context("Writing prep record")?;
            records_written += 1;
        }
        let processed = stream.session().rows_processed;
        if processed % PROGRESS_INTERVAL == 0 {
            info!("Processed {processed} record(s)");
        }
    }
    if let Some(writer) = prep {
        writer.flush().context("Flushing prep output")?;
    }

    let session = *stream.session();
    Ok(PassOutcome {
        summary: PassSummary {
            lines_read: session.lines_read,
            rows_processed: session.rows_processed,
            bytes_read: session.bytes_read,
            records_written,
        },
        columns: stream.columns,
        profiler,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DelimiterSpec, delimited::DelimitedLineParser, profile::SqlType,
    };
    use std::{collections::BTreeMap, io::Cursor};

    fn stream_over(text: &str, config: &LoadConfig) -> ColumnStream<Cursor<String>> {
        let reader_config = pass_reader_config(config, true);
        let delimiter = match reader_config.delimiter {
            DelimiterSpec::Char(byte) => byte,
            DelimiterSpec::Auto => b',',
        };
        let splitter = LineSplitter::Delimited(
            DelimitedLineParser::new(delimiter, reader_config.simple_parse)
                .with_embedded_tab_removal(reader_config.remove_embedded_tabs),
        );
        let reader = RecordReader::new(Cursor::new(text.to_string()), splitter, &reader_config);
        ColumnStream::from_reader(reader, config).expect("stream")
    }

    #[test]
    fn header_names_and_profile() {
        let mut config = LoadConfig::default();
        config.reader.header_line = 1;
        let stream = stream_over("id,amount\n1,2.50\n2,10\n", &config);
        assert_eq!(stream.name_source(), NameSource::HeaderLine);
        let mut prep = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(Vec::new());
        let outcome = run_pass(stream, &config, true, Some(&mut prep)).expect("pass");
        assert_eq!(outcome.columns, vec!["id", "amount"]);
        assert_eq!(outcome.summary.rows_processed, 2);
        assert_eq!(outcome.summary.records_written, 2);
        let profiler = outcome.profiler.expect("profiler");
        assert_eq!(profiler.final_type(0), Some(SqlType::Int));
        assert_eq!(
            profiler.final_type(1),
            Some(SqlType::Numeric {
                precision: 4,
                scale: 2
            })
        );
        let written = String::from_utf8(prep.into_inner().expect("inner")).expect("utf8");
        assert_eq!(written, "1\t2.50\n2\t10\n");
    }

    #[test]
    fn synthetic_names_follow_first_record() {
        let config = LoadConfig::default();
        let stream = stream_over("a,b,c\n", &config);
        assert_eq!(stream.columns(), &["col0", "col1", "col2"]);
        assert_eq!(stream.name_source(), NameSource::Synthetic);
    }

    #[test]
    fn short_records_are_padded_and_split() {
        let mut config = LoadConfig::default();
        config.reader.header_line = 1;
        config.splits = BTreeMap::from([("state".to_string(), ":".to_string())]);
        let mut stream = stream_over("state,zip\nMD:Maryland\n", &config);
        assert_eq!(stream.columns(), &["state", "state_descr", "zip"]);
        assert_eq!(
            stream.next_record().expect("record"),
            Some(vec!["MD".to_string(), "Maryland".to_string(), String::new()])
        );
        assert_eq!(stream.next_record().expect("end"), None);
    }

    #[test]
    fn prep_records_stay_on_one_line() {
        let mut config = LoadConfig::default();
        config.reader.delimiter = DelimiterSpec::Char(b',');
        let stream = stream_over("1,\"two\nlines\"\n", &config);
        let mut prep = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(Vec::new());
        let outcome = run_pass(stream, &config, false, Some(&mut prep)).expect("pass");
        assert!(outcome.profiler.is_none());
        assert_eq!(outcome.summary.lines_read, 2);
        let written = String::from_utf8(prep.into_inner().expect("inner")).expect("utf8");
        assert_eq!(written, "1\ttwo lines\n");
    }

    #[test]
    fn prep_config_strips_embedded_tabs() {
        let config = LoadConfig::default();
        assert!(pass_reader_config(&config, true).remove_embedded_tabs);
        assert!(!pass_reader_config(&config, false).remove_embedded_tabs);
    }
}
