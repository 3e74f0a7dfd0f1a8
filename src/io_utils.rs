//! I/O utilities for reading flat files and writing prep/report output.
//!
//! Data input and command output go through this module. It provides:
//!
//! - **Encoding**: input decoding to UTF-8 via `encoding_rs` / `encoding_rs_io`,
//!   defaulting to UTF-8 (a BOM, when present, wins).
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Prep output**: a tab-delimited, never-quoted `csv::Writer`, the layout
//!   bulk-copy tools expect.
//! - **Delimiter display**: printable names for delimiter bytes.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};

pub const PREP_DELIMITER: u8 = b'\t';

/// A file decoded to UTF-8 and buffered for line reads.
pub type DecodedFile = BufReader<DecodeReaderBytes<File, Vec<u8>>>;

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decoding_reader<R: Read>(reader: R, encoding: &'static Encoding) -> DecodeReaderBytes<R, Vec<u8>> {
    DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(reader)
}

pub fn open_decoded_file(path: &Path, encoding: &'static Encoding) -> io::Result<DecodedFile> {
    let file = File::open(path)?;
    Ok(BufReader::new(decoding_reader(file, encoding)))
}

/// Open `path` (or stdin for `-`) as a UTF-8 line source.
pub fn open_input(path: &Path, encoding: &'static Encoding) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if is_dash(path) {
        Box::new(BufReader::new(decoding_reader(io::stdin().lock(), encoding)))
    } else {
        Box::new(
            open_decoded_file(path, encoding)
                .with_context(|| format!("Opening input file {path:?}"))?,
        )
    };
    Ok(reader)
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    Ok(writer)
}

pub fn open_prep_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(PREP_DELIMITER)
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .has_headers(false);
    Ok(builder.from_writer(open_output(path)?))
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => "comma".to_string(),
        b'\t' => "tab".to_string(),
        b'|' => "pipe".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;
    use std::io::Cursor;

    #[test]
    fn decodes_legacy_encoding_to_utf8() {
        let (encoded, _, _) = WINDOWS_1252.encode("id,name\n1,Caf\u{e9}\n");
        let mut reader = BufReader::new(decoding_reader(Cursor::new(encoded.into_owned()), WINDOWS_1252));
        let mut text = String::new();
        reader.read_to_string(&mut text).expect("decode");
        assert_eq!(text, "id,name\n1,Caf\u{e9}\n");
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        assert!(resolve_encoding(Some("no-such-encoding")).is_err());
        assert_eq!(resolve_encoding(None).expect("default"), UTF_8);
    }

    #[test]
    fn printable_delimiter_names_common_bytes() {
        assert_eq!(printable_delimiter(b'\t'), "tab");
        assert_eq!(printable_delimiter(b';'), ";");
    }
}
