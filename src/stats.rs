//! Numeric summaries over the merged dataset.

use serde::Serialize;

use crate::merge::MergedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Number of values that parsed as numbers.
    pub count: usize,
}

#[derive(Debug, Default)]
struct NumericAccumulator {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericAccumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }

    fn finish(self) -> NumericStats {
        if self.count == 0 {
            return NumericStats {
                average: 0.0,
                minimum: 0.0,
                maximum: 0.0,
                count: 0,
            };
        }
        NumericStats {
            average: self.sum / self.count as f64,
            minimum: self.min.unwrap_or_default(),
            maximum: self.max.unwrap_or_default(),
            count: self.count,
        }
    }
}

/// Average, minimum and maximum of `field` over records where it parses as a
/// number. Values that do not parse are excluded rather than counted as zero.
pub fn numeric_stats(records: &[MergedRecord], field: &str) -> NumericStats {
    let mut acc = NumericAccumulator::default();
    for value in records.iter().filter_map(|r| r.value(field).as_number()) {
        acc.add(value);
    }
    acc.finish()
}

pub fn due_count(records: &[MergedRecord]) -> usize {
    records.iter().filter(|r| r.has_next_activity_due).count()
}

pub fn format_stat(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
