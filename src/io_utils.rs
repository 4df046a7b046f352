//! I/O helpers for delimited text: delimiter and encoding resolution, reader
//! and writer construction.
//!
//! - **Delimiter resolution**: extension-based (`.tsv` → tab, everything else
//!   comma) with manual override.
//! - **Encoding**: input decoded to UTF-8 through `encoding_rs_io` (a BOM
//!   always wins over the requested label); output transcoded with
//!   `encoding_rs`, defaulting to UTF-8.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| {
        if has_extension(path, &["tsv", "tab"]) {
            DEFAULT_TSV_DELIMITER
        } else {
            DEFAULT_CSV_DELIMITER
        }
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Opens `path` as a UTF-8 stream decoded from `encoding`.
pub fn open_decoded_reader(path: &Path, encoding: &'static Encoding) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .bom_override(true)
        .build(BufReader::new(file));
    Ok(Box::new(decoder))
}

pub fn open_csv_writer(delimiter: u8) -> csv::Writer<Vec<u8>> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(Vec::new())
}

pub fn encode_output(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        Err(anyhow!(
            "Failed to encode output using {}",
            encoding.name()
        ))
    } else {
        Ok(encoded.into_owned())
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.CSV"), None), b',');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap().name(), "windows-1252");
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn encode_output_transcodes_non_utf8_targets() {
        let latin1 = resolve_encoding(Some("latin1")).unwrap();
        assert_eq!(encode_output("café", latin1).unwrap(), b"caf\xe9".to_vec());
        assert_eq!(encode_output("café", UTF_8).unwrap(), "café".as_bytes().to_vec());
    }

    #[test]
    fn printable_delimiter_escapes_tab() {
        assert_eq!(printable_delimiter(b'\t'), "\\t");
        assert_eq!(printable_delimiter(b';'), ";");
    }
}
