//! Turns a file path into a [`RawTable`], choosing the reader by extension.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::Value,
    error::ReconcileError,
    io_utils,
    normalize::{RawRow, RawTable},
    workbook,
};

const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "tab", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited(u8),
    Spreadsheet,
}

impl SourceFormat {
    pub fn detect(path: &Path, delimiter: Option<u8>) -> Result<Self, ReconcileError> {
        if io_utils::has_extension(path, workbook::SPREADSHEET_EXTENSIONS) {
            Ok(SourceFormat::Spreadsheet)
        } else if io_utils::has_extension(path, DELIMITED_EXTENSIONS) || delimiter.is_some() {
            Ok(SourceFormat::Delimited(io_utils::resolve_input_delimiter(
                path, delimiter,
            )))
        } else {
            Err(ReconcileError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn read_table(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    match SourceFormat::detect(path, options.delimiter)? {
        SourceFormat::Spreadsheet => Ok(workbook::read_first_sheet(path)?),
        SourceFormat::Delimited(delimiter) => read_delimited(path, delimiter, options.encoding),
    }
}

fn read_delimited(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    let decoded = io_utils::open_decoded_reader(path, encoding)?;
    let mut reader = io_utils::open_csv_reader(decoded, delimiter);
    let headers = reader
        .headers()
        .with_context(|| format!("Reading headers from {path:?}"))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut table = RawTable::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).map(Value::from).unwrap_or(Value::Null);
                (header.clone(), value)
            })
            .collect();
        table.push(row);
    }
    debug!(
        "Read {} row(s) from {:?} with delimiter '{}'",
        table.len(),
        path,
        io_utils::printable_delimiter(delimiter)
    );
    Ok(table)
}
