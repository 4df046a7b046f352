//! `combine`: infer the join key and merge every table in a session.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::CombineArgs,
    config::MergeProfile,
    derive::{complete_fields, derive_due_flag},
    error::ReconcileError,
    keys::infer_key,
    merge::merge,
    session::{CombinedData, SessionHandle, SessionState, SessionStore},
};

pub fn execute(args: &CombineArgs) -> Result<()> {
    let handle = &args.session.session;
    let mut profile = MergeProfile::load_or_default(args.config.as_deref())?;
    if !args.keys.is_empty() {
        profile.key_candidates = args.keys.clone();
    }

    let mut store = crate::open_store(&args.session);
    let mut state = store.load_or_default(handle)?;
    let combined = combine_session(&mut state, handle, &profile)?;
    store
        .save(handle, &state)
        .with_context(|| format!("Saving session '{handle}'"))?;

    info!(
        "Combined {} table(s) on [{}]: {} record(s), {} row(s) without a key",
        state.tables.len(),
        combined.dataset.key.join(", "),
        combined.dataset.len(),
        combined.skipped_rows
    );
    Ok(())
}

/// Runs the full merge pipeline over the session's tables and stores the
/// result on the session, replacing any earlier merge.
pub fn combine_session(
    state: &mut SessionState,
    handle: &SessionHandle,
    profile: &MergeProfile,
) -> Result<CombinedData, ReconcileError> {
    if state.tables.is_empty() {
        return Err(ReconcileError::NoTables {
            session: handle.to_string(),
        });
    }
    let tables = state.record_sets();
    let key = infer_key(&tables, &profile.key_candidates)?;
    info!("Joining on [{}]", key.join(", "));
    let outcome = merge(&tables, &key);
    let dataset = derive_due_flag(complete_fields(outcome.dataset, &profile.display_fields));
    let combined = CombinedData {
        dataset,
        skipped_rows: outcome.skipped_rows,
        display_fields: profile.display_fields.clone(),
    };
    state.set_combined(combined.clone());
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::Value,
        normalize::{RawRow, normalize},
        session::StoredTable,
    };

    fn table(name: &str, rows: &[&[(&str, &str)]]) -> StoredTable {
        let raw: Vec<RawRow> = rows
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|(h, v)| (h.to_string(), Value::text(*v)))
                    .collect()
            })
            .collect();
        StoredTable::new(name, name, normalize(&raw))
    }

    #[test]
    fn merges_two_exports_on_organisation_id() {
        let mut state = SessionState::default();
        state.add_table(table(
            "crm.csv",
            &[&[("Org ID", "1"), ("Client", "Acme"), ("Carbon Factor", "")]],
        ));
        state.add_table(table(
            "esg.xlsx",
            &[&[
                ("organisation_id", "1"),
                ("carbon factor", "3.5"),
                ("Next Activity Due Date", "2024-02-01"),
            ]],
        ));

        let combined =
            combine_session(&mut state, &SessionHandle::default(), &MergeProfile::default())
                .unwrap();
        assert_eq!(combined.dataset.key, vec!["organisation_id".to_string()]);
        assert_eq!(combined.dataset.len(), 1);
        let record = &combined.dataset.records[0];
        assert_eq!(record.value("customer"), &Value::text("Acme"));
        assert_eq!(record.value("carbon_factor"), &Value::text("3.5"));
        assert_eq!(record.value("engagement_status"), &Value::Null);
        assert!(record.has_next_activity_due);
        assert_eq!(combined.display_fields, MergeProfile::default().display_fields);
        assert_eq!(state.combined.as_ref(), Some(&combined));
    }

    #[test]
    fn empty_session_is_an_error() {
        let mut state = SessionState::default();
        let err = combine_session(&mut state, &SessionHandle::default(), &MergeProfile::default())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NoTables { .. }));
    }

    #[test]
    fn missing_shared_key_leaves_no_merge() {
        let mut state = SessionState::default();
        state.add_table(table("a.csv", &[&[("organisation_id", "1")]]));
        state.add_table(table("b.csv", &[&[("customer", "Acme"), ("name", "Bob")]]));
        let err = combine_session(&mut state, &SessionHandle::default(), &MergeProfile::default())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::KeyInferenceFailed { .. }));
        assert!(state.combined.is_none());
    }
}
