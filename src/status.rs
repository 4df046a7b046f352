//! `status` and `reset`: inspect or discard a session.

use anyhow::Result;
use log::info;

use crate::{
    cli::StatusArgs,
    session::{SessionState, SessionStore},
    table,
};

pub fn execute(args: &StatusArgs) -> Result<()> {
    let handle = &args.session.session;
    let store = crate::open_store(&args.session);
    match store.load(handle)? {
        Some(state) => print!("{}", render_status(handle.as_str(), &state)),
        None => println!("Session '{handle}' is empty"),
    }
    Ok(())
}

pub fn reset(args: &StatusArgs) -> Result<()> {
    let handle = &args.session.session;
    let mut store = crate::open_store(&args.session);
    if store.remove(handle)? {
        info!("Discarded session '{handle}'");
    } else {
        info!("Session '{handle}' did not exist");
    }
    Ok(())
}

pub fn render_status(handle: &str, state: &SessionState) -> String {
    let mut output = format!("Session '{}': {} table(s)\n", handle, state.tables.len());
    let headers = ["file", "records", "dropped", "raw header", "canonical"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for stored in &state.tables {
        let mut first = true;
        for mapping in stored.header_map.entries() {
            let (file, records, dropped) = if first {
                (
                    stored.original_name.clone(),
                    stored.records.len().to_string(),
                    stored.dropped_rows.to_string(),
                )
            } else {
                Default::default()
            };
            first = false;
            rows.push(vec![
                file,
                records,
                dropped,
                mapping.raw.clone(),
                mapping.canonical.clone(),
            ]);
        }
    }
    if !rows.is_empty() {
        output.push_str(&table::render_table(&headers, &rows));
    }
    match &state.combined {
        Some(combined) => output.push_str(&format!(
            "Merged: {} record(s) on [{}], {} row(s) without a key\n",
            combined.dataset.len(),
            combined.dataset.key.join(", "),
            combined.skipped_rows
        )),
        None => output.push_str("Merged: not yet combined\n"),
    }
    output
}
