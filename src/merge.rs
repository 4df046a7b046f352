//! Merge engine: one record per composite key value.
//!
//! Records from every table are grouped by their trimmed key tuple. The first
//! record seen for a key creates the merged record; later records only fill
//! fields that are still blank. Blank source values are never written, so a
//! populated field can never regress.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{data::Value, keys::JoinKey, normalize::NormalizedRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub has_next_activity_due: bool,
}

impl MergedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The field's value, treating absent fields as [`Value::Null`].
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    fn fill(&mut self, field: &str, value: &Value) {
        if value.is_blank() {
            return;
        }
        match self.fields.get_mut(field) {
            Some(current) if !current.is_blank() => {}
            Some(current) => *current = value.clone(),
            None => {
                self.fields.insert(field.to_string(), value.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    pub key: JoinKey,
    pub records: Vec<MergedRecord>,
}

impl MergedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Alphabetically sorted union of field names across all records.
    pub fn field_names(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|record| record.fields.keys())
            .unique()
            .sorted()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub dataset: MergedDataset,
    /// Source records without a usable key value.
    pub skipped_rows: usize,
}

/// Trimmed, stringified key values; `None` when any key field is missing or blank.
pub fn composite_key(record: &NormalizedRecord, key: &[String]) -> Option<Vec<String>> {
    key.iter()
        .map(|field| record.get(field).and_then(Value::trimmed))
        .collect()
}

pub fn merge<T>(tables: &[T], key: &[String]) -> MergeOutcome
where
    T: AsRef<[NormalizedRecord]>,
{
    let mut lookup: HashMap<Vec<String>, usize> = HashMap::new();
    let mut records: Vec<MergedRecord> = Vec::new();
    let mut skipped_rows = 0usize;

    for (table_idx, table) in tables.iter().enumerate() {
        for (row_idx, record) in table.as_ref().iter().enumerate() {
            let Some(values) = composite_key(record, key) else {
                debug!(
                    "Skipping table {} record {}: missing join key {:?}",
                    table_idx + 1,
                    row_idx + 1,
                    key
                );
                skipped_rows += 1;
                continue;
            };
            let slot = match lookup.get(&values) {
                Some(&slot) => slot,
                None => {
                    let mut target = MergedRecord::default();
                    for (field, value) in key.iter().zip(values.iter()) {
                        target.fields.insert(field.clone(), Value::text(value.as_str()));
                    }
                    records.push(target);
                    lookup.insert(values, records.len() - 1);
                    records.len() - 1
                }
            };
            let target = &mut records[slot];
            for (field, value) in record {
                target.fill(field, value);
            }
        }
    }

    info!(
        "Merged {} table(s) on [{}] into {} record(s); skipped {} unkeyed row(s)",
        tables.len(),
        key.join(", "),
        records.len(),
        skipped_rows
    );

    MergeOutcome {
        dataset: MergedDataset {
            key: key.to_vec(),
            records,
        },
        skipped_rows,
    }
}
