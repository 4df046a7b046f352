use std::collections::HashMap;

use serde::Serialize;

use crate::merge::MergedRecord;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Occurrences of each stringified value of `field`, blanks counted under
/// `"Unknown"`, in first-seen order.
pub fn value_count_breakdown(records: &[MergedRecord], field: &str) -> Vec<ValueCount> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();
    for record in records {
        let value = record.value(field);
        let label = match value.as_display() {
            Some(display) if !value.is_blank() => display,
            _ => UNKNOWN_LABEL.to_string(),
        };
        match positions.get(&label) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                positions.insert(label.clone(), counts.len());
                counts.push(ValueCount {
                    value: label,
                    count: 1,
                });
            }
        }
    }
    counts
}

/// `[field, value, count, percent]` rows for terminal display.
pub fn render_rows(field: &str, counts: &[ValueCount]) -> Vec<Vec<String>> {
    let total = counts.iter().map(|c| c.count).sum::<usize>();
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .map(|entry| {
            let percent = (entry.count as f64 / total as f64) * 100.0;
            vec![
                field.to_string(),
                entry.value.clone(),
                entry.count.to_string(),
                format!("{percent:.2}%"),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn records(values: Vec<Value>) -> Vec<MergedRecord> {
        values
            .into_iter()
            .map(|v| {
                let mut record = MergedRecord::default();
                record.fields.insert("engagement_status".to_string(), v);
                record
            })
            .collect()
    }

    #[test]
    fn counts_in_first_seen_order_with_unknown_bucket() {
        let rows = records(vec![
            Value::text("Live"),
            Value::Null,
            Value::text("Paused"),
            Value::text("Live"),
            Value::text("  "),
        ]);
        let counts = value_count_breakdown(&rows, "engagement_status");
        let pairs = counts
            .iter()
            .map(|c| (c.value.as_str(), c.count))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![("Live", 2), ("Unknown", 2), ("Paused", 1)]);
    }

    #[test]
    fn missing_field_counts_as_unknown() {
        let rows = vec![MergedRecord::default()];
        let counts = value_count_breakdown(&rows, "product_status");
        assert_eq!(counts, vec![ValueCount { value: "Unknown".into(), count: 1 }]);
    }

    #[test]
    fn render_rows_reports_percentages() {
        let counts = vec![
            ValueCount { value: "Live".into(), count: 3 },
            ValueCount { value: "Unknown".into(), count: 1 },
        ];
        let rows = render_rows("engagement_status", &counts);
        assert_eq!(rows[0], vec!["engagement_status", "Live", "3", "75.00%"]);
        assert_eq!(rows[1][3], "25.00%");
        assert!(render_rows("x", &[]).is_empty());
    }
}
