//! `ingest`: read, normalize and store input files in a session.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use sha2::{Digest, Sha256};

use crate::{
    cli::IngestArgs,
    columns::AliasRegistry,
    config::MergeProfile,
    io_utils,
    normalize::normalize_with,
    session::{SessionHandle, SessionState, SessionStore, StoredTable},
    source::{self, ReadOptions},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub name: String,
    pub records: usize,
    pub dropped_rows: usize,
    /// Content was already present in the session.
    pub duplicate: bool,
}

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub ingested: Vec<IngestedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

pub fn execute(args: &IngestArgs) -> Result<()> {
    let handle = if args.new_session {
        SessionHandle::generate()
    } else {
        args.session.session.clone()
    };
    let profile = MergeProfile::load_or_default(args.config.as_deref())?;
    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };

    let mut store = crate::open_store(&args.session);
    let mut state = store.load_or_default(&handle)?;
    let summary = ingest_files(&mut state, &args.inputs, &options, &profile.registry());
    if summary.ingested.is_empty() {
        bail!(
            "None of the {} input file(s) could be read",
            args.inputs.len()
        );
    }
    store
        .save(&handle, &state)
        .with_context(|| format!("Saving session '{handle}'"))?;

    info!(
        "Session '{}' now holds {} table(s); {} file(s) ingested, {} skipped",
        handle,
        state.tables.len(),
        summary.ingested.len(),
        summary.failed.len()
    );
    println!("{handle}");
    Ok(())
}

/// Ingests every path, logging and skipping the ones that cannot be read.
pub fn ingest_files(
    state: &mut SessionState,
    paths: &[PathBuf],
    options: &ReadOptions,
    registry: &AliasRegistry,
) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for path in paths {
        match ingest_file(state, path, options, registry) {
            Ok(file) => {
                info!(
                    "Ingested {:?}: {} record(s), {} blank row(s) dropped",
                    path, file.records, file.dropped_rows
                );
                summary.ingested.push(file);
            }
            Err(err) => {
                warn!("Skipping {:?}: {:#}", path, err);
                summary.failed.push((path.clone(), format!("{err:#}")));
            }
        }
    }
    if !summary.ingested.is_empty() && state.combined.take().is_some() {
        info!("Discarded the previous merged dataset; run `combine` again");
    }
    summary
}

pub fn ingest_file(
    state: &mut SessionState,
    path: &Path,
    options: &ReadOptions,
    registry: &AliasRegistry,
) -> Result<IngestedFile> {
    let bytes = fs::read(path).with_context(|| format!("Reading {path:?}"))?;
    let digest = content_digest(&bytes);
    let duplicate = state.contains_digest(&digest);
    if duplicate {
        warn!("{path:?} has the same content as a file already in this session");
    }

    let raw = source::read_table(path, options)?;
    let normalized = normalize_with(&raw, registry);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = IngestedFile {
        name: name.clone(),
        records: normalized.records.len(),
        dropped_rows: normalized.dropped_rows,
        duplicate,
    };
    state.add_table(StoredTable::new(&name, &digest, normalized));
    Ok(file)
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn skips_unreadable_files_and_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("crm.csv");
        fs::write(&good, "Org ID,Client\n1,Acme\n,\n").unwrap();
        let missing = dir.path().join("missing.csv");
        let unsupported = dir.path().join("notes.pdf");
        fs::write(&unsupported, "%PDF").unwrap();

        let mut state = SessionState::default();
        let summary = ingest_files(
            &mut state,
            &[missing, good, unsupported],
            &ReadOptions::default(),
            &AliasRegistry::builtin(),
        );

        assert_eq!(summary.failed.len(), 2);
        assert_eq!(
            summary.ingested,
            vec![IngestedFile {
                name: "crm.csv".to_string(),
                records: 1,
                dropped_rows: 1,
                duplicate: false,
            }]
        );
        assert_eq!(state.tables.len(), 1);
        assert_eq!(
            state.tables[0].records[0].get("customer"),
            Some(&Value::text("Acme"))
        );
    }

    #[test]
    fn flags_duplicate_content() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        fs::write(&first, "organisation_id\n1\n").unwrap();
        fs::write(&second, "organisation_id\n1\n").unwrap();

        let mut state = SessionState::default();
        let registry = AliasRegistry::builtin();
        let options = ReadOptions::default();
        assert!(!ingest_file(&mut state, &first, &options, &registry).unwrap().duplicate);
        assert!(ingest_file(&mut state, &second, &options, &registry).unwrap().duplicate);
        assert_eq!(state.tables.len(), 2);
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
