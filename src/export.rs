//! `export`: serialize the merged dataset to CSV, TSV or XLSX.
//!
//! Columns are the sorted union of every merged field plus
//! `has_next_activity_due`, written as `true`/`false`.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    cli::{ExportArgs, ExportFormat},
    columns::NEXT_ACTIVITY_DUE_DATE,
    data::Value,
    dates::parse_date,
    derive::HAS_NEXT_ACTIVITY_DUE,
    error::ReconcileError,
    io_utils::{self, DEFAULT_CSV_DELIMITER, DEFAULT_TSV_DELIMITER},
    merge::{MergedDataset, MergedRecord},
    session::SessionStore,
    workbook,
};

pub fn execute(args: &ExportArgs) -> Result<()> {
    let handle = &args.session.session;
    let store = crate::open_store(&args.session);
    let state = store.load_or_default(handle)?;
    let combined = state
        .combined
        .ok_or_else(|| ReconcileError::NoCombinedData {
            session: handle.to_string(),
        })?;

    let format = args
        .format
        .unwrap_or_else(|| format_for_path(&args.output));
    let bytes = match format {
        ExportFormat::Xlsx => write_xlsx(&combined.dataset, args.normalize_dates)?,
        ExportFormat::Csv | ExportFormat::Tsv => {
            let delimiter = if format == ExportFormat::Tsv {
                DEFAULT_TSV_DELIMITER
            } else {
                DEFAULT_CSV_DELIMITER
            };
            let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
            write_csv(&combined.dataset, delimiter, encoding, args.normalize_dates)?
        }
    };
    fs::write(&args.output, bytes)
        .with_context(|| format!("Writing export to {:?}", args.output))?;
    info!(
        "Exported {} record(s) as {:?} to {:?}",
        combined.dataset.len(),
        format,
        args.output
    );
    Ok(())
}

pub fn format_for_path(path: &Path) -> ExportFormat {
    if io_utils::has_extension(path, &["xlsx"]) {
        ExportFormat::Xlsx
    } else if io_utils::has_extension(path, &["tsv", "tab"]) {
        ExportFormat::Tsv
    } else {
        ExportFormat::Csv
    }
}

pub fn export_headers(dataset: &MergedDataset) -> Vec<String> {
    let mut headers = dataset.field_names();
    if !headers.iter().any(|h| h == HAS_NEXT_ACTIVITY_DUE) {
        headers.push(HAS_NEXT_ACTIVITY_DUE.to_string());
        headers.sort();
    }
    headers
}

fn export_value(record: &MergedRecord, header: &str, normalize_dates: bool) -> Value {
    if header == HAS_NEXT_ACTIVITY_DUE {
        return Value::text(record.has_next_activity_due.to_string());
    }
    let value = record.value(header);
    if normalize_dates && header == NEXT_ACTIVITY_DUE_DATE {
        if let Some(date) = parse_date(value) {
            return Value::text(date);
        }
    }
    value.clone()
}

pub fn export_rows(dataset: &MergedDataset, headers: &[String], normalize_dates: bool) -> Vec<Vec<Value>> {
    dataset
        .records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| export_value(record, header, normalize_dates))
                .collect()
        })
        .collect()
}

pub fn write_csv(
    dataset: &MergedDataset,
    delimiter: u8,
    encoding: &'static Encoding,
    normalize_dates: bool,
) -> Result<Vec<u8>> {
    let headers = export_headers(dataset);
    let mut writer = io_utils::open_csv_writer(delimiter);
    writer
        .write_record(&headers)
        .context("Writing export headers")?;
    for (idx, row) in export_rows(dataset, &headers, normalize_dates)
        .iter()
        .enumerate()
    {
        writer
            .write_record(row.iter().map(|value| value.to_string()))
            .with_context(|| format!("Writing export row {}", idx + 2))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Flushing export buffer: {}", err.error()))?;
    let text = String::from_utf8(buffer).context("Export buffer is not UTF-8")?;
    io_utils::encode_output(&text, encoding)
}

pub fn write_xlsx(dataset: &MergedDataset, normalize_dates: bool) -> Result<Vec<u8>> {
    let headers = export_headers(dataset);
    let rows = export_rows(dataset, &headers, normalize_dates);
    workbook::write_sheet(&headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use std::path::PathBuf;

    fn dataset() -> MergedDataset {
        let mut first = MergedRecord::default();
        first.fields.insert("organisation_id".into(), Value::text("1"));
        first.fields.insert("customer".into(), Value::text("Café, Ltd"));
        first
            .fields
            .insert(NEXT_ACTIVITY_DUE_DATE.into(), Value::text("03/04/2024"));
        first.has_next_activity_due = true;
        let mut second = MergedRecord::default();
        second.fields.insert("organisation_id".into(), Value::text("2"));
        second.fields.insert("carbon_factor".into(), Value::Number(2.5));
        second.fields.insert(NEXT_ACTIVITY_DUE_DATE.into(), Value::Null);
        MergedDataset {
            key: vec!["organisation_id".to_string()],
            records: vec![first, second],
        }
    }

    #[test]
    fn csv_uses_sorted_union_and_flag_column() {
        let bytes = write_csv(&dataset(), b',', UTF_8, false).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "carbon_factor,customer,has_next_activity_due,next_activity_due_date,organisation_id"
        );
        assert_eq!(lines[1], ",\"Café, Ltd\",true,03/04/2024,1");
        assert_eq!(lines[2], "2.5,,false,,2");
    }

    #[test]
    fn normalize_dates_rewrites_parseable_due_dates() {
        let bytes = write_csv(&dataset(), b'\t', UTF_8, true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().nth(1).unwrap().contains("\t2024-03-04\t"));
    }

    #[test]
    fn csv_output_is_transcoded() {
        let bytes = write_csv(&dataset(), b',', WINDOWS_1252, false).unwrap();
        assert!(bytes.windows(4).any(|w| w == b"Caf\xe9"));
    }

    #[test]
    fn xlsx_export_reads_back() {
        let bytes = write_xlsx(&dataset(), false).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        fs::write(&path, bytes).unwrap();
        let table = workbook::read_first_sheet(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table[1].contains(&("carbon_factor".to_string(), Value::Number(2.5))));
        assert!(table[0].contains(&("has_next_activity_due".to_string(), Value::text("true"))));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(format_for_path(&PathBuf::from("a.XLSX")), ExportFormat::Xlsx);
        assert_eq!(format_for_path(&PathBuf::from("a.tsv")), ExportFormat::Tsv);
        assert_eq!(format_for_path(&PathBuf::from("a.out")), ExportFormat::Csv);
    }
}
