//! Plain-text table rendering for terminal output.

use std::fmt::Write as _;

use crate::merge::MergedRecord;

/// Cells wider than this are cut and suffixed with `…`.
pub const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let headers = headers.iter().map(|h| clean_cell(h)).collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| clean_cell(cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(&headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", join_padded(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", join_padded(row, &widths));
    }
    output
}

/// One row per record with the requested fields; null renders empty.
pub fn record_rows<S: AsRef<str>>(records: &[MergedRecord], fields: &[S]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| record.value(field.as_ref()).to_string())
                .collect()
        })
        .collect()
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn clean_cell(value: &str) -> String {
    let flattened = value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect::<String>();
    if flattened.chars().count() > MAX_CELL_WIDTH {
        let mut cut = flattened
            .chars()
            .take(MAX_CELL_WIDTH - 1)
            .collect::<String>();
        cut.push('…');
        cut
    } else {
        flattened
    }
}
