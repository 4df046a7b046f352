//! Post-merge passes that make the dataset display-ready.

use crate::{
    columns::{
        CARBON_FACTOR, CUSTOMER, ENGAGEMENT_STATUS, NAME, NEXT_ACTIVITY_DUE_DATE, ORGANISATION_ID,
        PRODUCT_STATUS,
    },
    data::Value,
    merge::MergedDataset,
};

pub const HAS_NEXT_ACTIVITY_DUE: &str = "has_next_activity_due";

pub const DISPLAY_FIELDS: &[&str] = &[
    ORGANISATION_ID,
    CUSTOMER,
    NAME,
    PRODUCT_STATUS,
    ENGAGEMENT_STATUS,
    CARBON_FACTOR,
    NEXT_ACTIVITY_DUE_DATE,
];

pub fn default_display_fields() -> Vec<String> {
    DISPLAY_FIELDS.iter().map(|f| f.to_string()).collect()
}

/// Guarantees every display field exists on every record, defaulting to null.
pub fn complete_fields<S: AsRef<str>>(mut dataset: MergedDataset, display_fields: &[S]) -> MergedDataset {
    for record in &mut dataset.records {
        for field in display_fields {
            record
                .fields
                .entry(field.as_ref().to_string())
                .or_insert(Value::Null);
        }
    }
    dataset
}

pub fn derive_due_flag(mut dataset: MergedDataset) -> MergedDataset {
    for record in &mut dataset.records {
        record.has_next_activity_due = !record.value(NEXT_ACTIVITY_DUE_DATE).is_blank();
    }
    dataset
}
