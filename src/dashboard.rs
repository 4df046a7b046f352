//! `dashboard`: summary views over the merged dataset.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::DashboardArgs,
    columns::{CARBON_FACTOR, ENGAGEMENT_STATUS, PRODUCT_STATUS},
    derive::HAS_NEXT_ACTIVITY_DUE,
    error::ReconcileError,
    frequency::{self, ValueCount},
    merge::MergedDataset,
    session::{CombinedData, SessionStore},
    stats::{self, NumericStats},
    table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_records: usize,
    pub skipped_rows: usize,
    pub key: Vec<String>,
    pub engagement_breakdown: Vec<ValueCount>,
    pub product_breakdown: Vec<ValueCount>,
    pub carbon_factor: NumericStats,
    pub next_activity_due: usize,
    pub sample_headers: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
}

pub fn execute(args: &DashboardArgs) -> Result<()> {
    let handle = &args.session.session;
    let store = crate::open_store(&args.session);
    let state = store.load_or_default(handle)?;
    let combined = state
        .combined
        .ok_or_else(|| ReconcileError::NoCombinedData {
            session: handle.to_string(),
        })?;
    let dashboard = build_dashboard(&combined, args.rows);
    if args.json {
        let json =
            serde_json::to_string_pretty(&dashboard).context("Serializing dashboard to JSON")?;
        println!("{json}");
    } else {
        print!("{}", render_dashboard(&dashboard));
    }
    Ok(())
}

pub fn build_dashboard(combined: &CombinedData, sample_rows: usize) -> Dashboard {
    let dataset: &MergedDataset = &combined.dataset;
    let records = dataset.records.as_slice();
    let mut sample_headers = combined.display_fields.clone();
    let mut rows = table::record_rows(&records[..sample_rows.min(records.len())], &sample_headers);
    for (row, record) in rows.iter_mut().zip(records) {
        row.push(record.has_next_activity_due.to_string());
    }
    sample_headers.push(HAS_NEXT_ACTIVITY_DUE.to_string());

    Dashboard {
        total_records: dataset.len(),
        skipped_rows: combined.skipped_rows,
        key: dataset.key.clone(),
        engagement_breakdown: frequency::value_count_breakdown(records, ENGAGEMENT_STATUS),
        product_breakdown: frequency::value_count_breakdown(records, PRODUCT_STATUS),
        carbon_factor: stats::numeric_stats(records, CARBON_FACTOR),
        next_activity_due: stats::due_count(records),
        sample_headers,
        sample_rows: rows,
    }
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Total records: {} (joined on [{}], {} row(s) without a key)\n",
        dashboard.total_records,
        dashboard.key.join(", "),
        dashboard.skipped_rows
    ));
    output.push_str(&format!(
        "Next activity due: {}\n\n",
        dashboard.next_activity_due
    ));

    let breakdown_headers = ["field", "value", "count", "percent"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    for (field, counts) in [
        (ENGAGEMENT_STATUS, &dashboard.engagement_breakdown),
        (PRODUCT_STATUS, &dashboard.product_breakdown),
    ] {
        output.push_str(&table::render_table(
            &breakdown_headers,
            &frequency::render_rows(field, counts),
        ));
        output.push('\n');
    }

    let carbon = &dashboard.carbon_factor;
    output.push_str(&table::render_table(
        &["statistic".to_string(), CARBON_FACTOR.to_string()],
        &[
            vec!["average".to_string(), stats::format_stat(carbon.average)],
            vec!["minimum".to_string(), stats::format_stat(carbon.minimum)],
            vec!["maximum".to_string(), stats::format_stat(carbon.maximum)],
            vec!["count".to_string(), carbon.count.to_string()],
        ],
    ));
    output.push('\n');

    output.push_str(&table::render_table(
        &dashboard.sample_headers,
        &dashboard.sample_rows,
    ));
    output
}
