//! Spreadsheet reading (calamine) and writing (rust_xlsxwriter).
//!
//! Only the first worksheet is read. Its first row supplies the headers;
//! columns with an empty header are ignored and rows whose cells are all
//! blank are skipped.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use log::debug;
use rust_xlsxwriter::Workbook;

use crate::{
    data::Value,
    dates::parse_date_text,
    error::ReconcileError,
    normalize::{RawRow, RawTable},
};

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Maximum rows/columns rust_xlsxwriter accepts.
const MAX_XLSX_ROWS: usize = 1_048_576;
const MAX_XLSX_COLS: usize = 16_384;

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(parsed) => Value::Date(parsed.date()),
            None => Value::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

fn header_text(cell: &Data) -> String {
    cell_value(cell).as_display().unwrap_or_default()
}

pub fn read_first_sheet(path: &Path) -> Result<RawTable, ReconcileError> {
    let spreadsheet_error = |message: String| ReconcileError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(spreadsheet_error("workbook contains no sheets".to_string()));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| spreadsheet_error(format!("sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_row.iter().map(header_text).collect::<Vec<_>>();

    let mut table = RawTable::new();
    for (row_idx, cells) in rows.enumerate() {
        let row: RawRow = headers
            .iter()
            .zip(cells.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_value(cell)))
            .collect();
        if row.iter().all(|(_, value)| value.is_blank()) {
            debug!("Skipping blank sheet row {}", row_idx + 2);
            continue;
        }
        table.push(row);
    }
    debug!(
        "Read {} row(s) from sheet '{}' of {:?}",
        table.len(),
        sheet_name,
        path
    );
    Ok(table)
}

/// Serializes `rows` under `headers` into an in-memory `.xlsx` workbook.
pub fn write_sheet(headers: &[String], rows: &[Vec<Value>]) -> Result<Vec<u8>> {
    anyhow::ensure!(
        rows.len() < MAX_XLSX_ROWS && headers.len() <= MAX_XLSX_COLS,
        "Dataset of {} row(s) x {} column(s) exceeds spreadsheet limits",
        rows.len(),
        headers.len()
    );
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("combined")
        .context("Naming worksheet")?;

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .with_context(|| format!("Writing header '{header}'"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate().take(headers.len()) {
            let excel_col = col as u16;
            match value {
                Value::Null => {}
                Value::Number(n) if n.is_finite() => {
                    worksheet
                        .write_number(excel_row, excel_col, *n)
                        .with_context(|| format!("Writing row {}", row_idx + 2))?;
                }
                other => {
                    let text = other.as_display().unwrap_or_default();
                    worksheet
                        .write_string(excel_row, excel_col, &text)
                        .with_context(|| format!("Writing row {}", row_idx + 2))?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("Serializing spreadsheet")
}
