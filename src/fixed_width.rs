//! Fixed-width column splitting and format auto-detection.
//!
//! A [`FieldBoundaryTable`] holds the start offset of every column plus a
//! trailing sentinel, and can come from two [`BoundarySource`]s:
//!
//! - [`ExplicitWidths`]: caller-supplied widths, trusted as-is.
//! - [`DerivedFromSample`]: every "whitespace followed by non-whitespace"
//!   position seen anywhere in the file becomes a boundary, after which a second
//!   pass checks that every line has a space right before every boundary it
//!   reaches. Files that fail the check are reported as not parseable.
//!
//! Both file passes share [`scan_lines`], which feeds tab-expanded lines to a
//! [`LineVisitor`] strategy.

use std::{
    collections::BTreeSet,
    io::BufRead,
    ops::ControlFlow,
    path::PathBuf,
    sync::OnceLock,
};

use encoding_rs::Encoding;
use log::debug;
use regex::Regex;

use crate::{
    error::{LoadError, LoadResult},
    io_utils,
};

const UNBOUNDED: usize = usize::MAX;

fn start_of_field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s[^\s]").expect("valid start-of-field pattern"))
}

/// Ordered column start offsets, always beginning at 0 and ending with an
/// unbounded sentinel. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBoundaryTable {
    starts: Vec<usize>,
}

impl FieldBoundaryTable {
    pub fn from_widths(widths: &[usize]) -> LoadResult<Self> {
        let mut starts = Vec::with_capacity(widths.len() + 1);
        let mut cumulative = 0usize;
        for (index, &width) in widths.iter().enumerate() {
            if width == 0 {
                return Err(LoadError::InvalidWidth { index, width });
            }
            starts.push(cumulative);
            cumulative += width;
        }
        starts.push(UNBOUNDED);
        Ok(Self { starts })
    }

    fn from_starts(detected: BTreeSet<usize>) -> Self {
        let mut starts: Vec<usize> = std::iter::once(0)
            .chain(detected.into_iter().filter(|&start| start > 0))
            .collect();
        starts.push(UNBOUNDED);
        Self { starts }
    }

    pub fn column_count(&self) -> usize {
        self.starts.len() - 1
    }

    /// Start offsets of every column, without the sentinel.
    pub fn column_starts(&self) -> &[usize] {
        &self.starts[..self.starts.len() - 1]
    }

    /// Offsets where a column begins after another one ends.
    fn inner_boundaries(&self) -> impl Iterator<Item = usize> + '_ {
        self.starts[1..self.starts.len() - 1].iter().copied()
    }

    /// Split a tab-free line into one trimmed field per column. Lines that stop
    /// short of a boundary yield their remaining text as the last available
    /// field, followed by empty strings.
    pub fn split_line(&self, line: &str) -> Vec<String> {
        let chars: Vec<char> = line.chars().collect();
        let mut fields = Vec::with_capacity(self.column_count());
        let mut prior = 0usize;
        for &start in &self.starts[1..] {
            if chars.len() < start {
                let rest: String = chars[prior.min(chars.len())..].iter().collect();
                fields.push(rest.trim().to_string());
                break;
            }
            let slice: String = chars[prior..start].iter().collect();
            fields.push(slice.trim().to_string());
            prior = start;
        }
        fields.resize(self.column_count(), String::new());
        fields
    }
}

/// Expand tabs to `tab_size` spaces.
pub fn expand_tabs(line: &str, tab_size: usize) -> String {
    if line.contains('\t') {
        line.replace('\t', &" ".repeat(tab_size))
    } else {
        line.to_string()
    }
}

/// One strategy applied to every line of a [`scan_lines`] pass.
pub trait LineVisitor {
    fn visit(&mut self, line_number: usize, line: &str) -> ControlFlow<()>;
}

/// Stream `reader`, expanding tabs, and hand each line to `visitor` until it
/// breaks or the input ends.
pub fn scan_lines<R, V>(reader: R, tab_size: usize, visitor: &mut V) -> LoadResult<()>
where
    R: BufRead,
    V: LineVisitor + ?Sized,
{
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let expanded = expand_tabs(line.trim_end_matches('\r'), tab_size);
        if visitor.visit(idx + 1, &expanded).is_break() {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct BoundaryCollector {
    starts: BTreeSet<usize>,
}

impl LineVisitor for BoundaryCollector {
    fn visit(&mut self, _line_number: usize, line: &str) -> ControlFlow<()> {
        for found in start_of_field_pattern().find_iter(line) {
            let offset = line[..found.start()].chars().count() + 1;
            self.starts.insert(offset);
        }
        ControlFlow::Continue(())
    }
}

#[derive(Debug)]
struct ConsistencyCheck<'a> {
    table: &'a FieldBoundaryTable,
    violation: Option<(usize, usize)>,
}

impl LineVisitor for ConsistencyCheck<'_> {
    fn visit(&mut self, line_number: usize, line: &str) -> ControlFlow<()> {
        let chars: Vec<char> = line.chars().collect();
        for start in self.table.inner_boundaries() {
            if chars.len() < start {
                break;
            }
            if chars[start - 1] != ' ' {
                self.violation = Some((line_number, start));
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Whether a boundary table can be trusted for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parseability {
    Parseable,
    NotParseable { line: usize, offset: usize },
}

/// Where a fixed-width file's column boundaries come from.
pub trait BoundarySource {
    fn resolve(&self) -> LoadResult<(FieldBoundaryTable, Parseability)>;
}

#[derive(Debug, Clone)]
pub struct ExplicitWidths(pub Vec<usize>);

impl BoundarySource for ExplicitWidths {
    fn resolve(&self) -> LoadResult<(FieldBoundaryTable, Parseability)> {
        Ok((
            FieldBoundaryTable::from_widths(&self.0)?,
            Parseability::Parseable,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct DerivedFromSample {
    pub path: PathBuf,
    pub tab_size: usize,
    pub encoding: &'static Encoding,
}

impl DerivedFromSample {
    fn open(&self) -> LoadResult<io_utils::DecodedFile> {
        if io_utils::is_dash(&self.path) {
            return Err(LoadError::StdinNotSeekable {
                operation: "fixed-width format detection",
            });
        }
        Ok(io_utils::open_decoded_file(&self.path, self.encoding)?)
    }
}

impl BoundarySource for DerivedFromSample {
    fn resolve(&self) -> LoadResult<(FieldBoundaryTable, Parseability)> {
        let resolved = derive_and_validate(|| self.open(), self.tab_size)?;
        debug!(
            "Derived {} fixed-width column(s) from {:?}: {:?}",
            resolved.0.column_count(),
            self.path,
            resolved.0.column_starts()
        );
        Ok(resolved)
    }
}

/// Collect boundaries over one pass of the input, then validate them over a
/// second pass. `open` is called once per pass.
fn derive_and_validate<R, F>(
    mut open: F,
    tab_size: usize,
) -> LoadResult<(FieldBoundaryTable, Parseability)>
where
    R: BufRead,
    F: FnMut() -> LoadResult<R>,
{
    let mut collector = BoundaryCollector::default();
    scan_lines(open()?, tab_size, &mut collector)?;
    let table = FieldBoundaryTable::from_starts(collector.starts);

    let mut check = ConsistencyCheck {
        table: &table,
        violation: None,
    };
    scan_lines(open()?, tab_size, &mut check)?;
    let parseability = match check.violation {
        Some((line, offset)) => Parseability::NotParseable { line, offset },
        None => Parseability::Parseable,
    };
    Ok((table, parseability))
}
