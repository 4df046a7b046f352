//! Record normalization: raw header/value rows to canonical-field records.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{columns::AliasRegistry, data::Value};

/// One parsed row: raw header text paired with its cell, in column order.
pub type RawRow = Vec<(String, Value)>;
pub type RawTable = Vec<RawRow>;
pub type NormalizedRecord = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub raw: String,
    pub canonical: String,
}

/// Raw header to canonical field, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMap {
    entries: Vec<HeaderMapping>,
}

impl HeaderMap {
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.raw == raw)
            .map(|m| m.canonical.as_str())
    }

    pub fn entries(&self) -> &[HeaderMapping] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, raw: &str, canonical: &str) {
        self.entries.push(HeaderMapping {
            raw: raw.to_string(),
            canonical: canonical.to_string(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub header_map: HeaderMap,
    /// Rows dropped because every value was blank.
    pub dropped_rows: usize,
}

pub fn normalize(table: &[RawRow]) -> Normalized {
    normalize_with(table, &AliasRegistry::builtin())
}

pub fn normalize_with(table: &[RawRow], registry: &AliasRegistry) -> Normalized {
    let mut resolved: HashMap<&str, String> = HashMap::new();
    let mut header_map = HeaderMap::default();
    let mut records = Vec::with_capacity(table.len());
    let mut dropped_rows = 0usize;

    for (row_idx, row) in table.iter().enumerate() {
        let mut record = NormalizedRecord::new();
        for (raw, value) in row {
            if raw.is_empty() {
                continue;
            }
            let canonical = resolved.entry(raw.as_str()).or_insert_with(|| {
                let canonical = registry.canonicalize(raw);
                header_map.push(raw, &canonical);
                canonical
            });
            match record.get(canonical.as_str()) {
                Some(existing) if !existing.is_blank() => {}
                Some(_) if value.is_blank() => {}
                _ => {
                    record.insert(canonical.clone(), value.clone());
                }
            }
        }
        if record.values().any(|value| !value.is_blank()) {
            records.push(record);
        } else {
            debug!("Dropping blank row {}", row_idx + 1);
            dropped_rows += 1;
        }
    }

    Normalized {
        records,
        header_map,
        dropped_rows,
    }
}
