//! Join key inference across independently uploaded tables.

use std::collections::HashSet;

use log::debug;

use crate::{
    columns::{CUSTOMER, NAME, ORGANISATION_ID},
    error::ReconcileError,
    normalize::NormalizedRecord,
};

pub type JoinKey = Vec<String>;

/// `[[organisation_id], [customer, name]]`
pub fn default_candidates() -> Vec<JoinKey> {
    vec![
        vec![ORGANISATION_ID.to_string()],
        vec![CUSTOMER.to_string(), NAME.to_string()],
    ]
}

/// Parses one comma-separated key set such as `customer,name`.
pub fn parse_key_set(spec: &str) -> Result<JoinKey, String> {
    let fields = spec
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if fields.is_empty() {
        Err("Join key cannot be empty".to_string())
    } else {
        Ok(fields)
    }
}

fn available_fields(table: &[NormalizedRecord]) -> HashSet<&str> {
    table
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect()
}

/// Returns the first candidate whose fields all appear in every table.
pub fn infer_key<T>(tables: &[T], candidates: &[JoinKey]) -> Result<JoinKey, ReconcileError>
where
    T: AsRef<[NormalizedRecord]>,
{
    let failed = || ReconcileError::KeyInferenceFailed {
        candidates: candidates.to_vec(),
    };
    if tables.is_empty() {
        return Err(failed());
    }
    let field_sets = tables
        .iter()
        .map(|table| available_fields(table.as_ref()))
        .collect::<Vec<_>>();

    for candidate in candidates.iter().filter(|c| !c.is_empty()) {
        let accepted = field_sets
            .iter()
            .all(|fields| candidate.iter().all(|key| fields.contains(key.as_str())));
        if accepted {
            debug!("Join key candidate {:?} present in all {} table(s)", candidate, tables.len());
            return Ok(candidate.clone());
        }
        debug!("Join key candidate {:?} rejected", candidate);
    }
    Err(failed())
}
