//! Transient per-session state and the stores that hold it.
//!
//! The merge pipeline never keeps state of its own. Commands load a
//! [`SessionState`] from a [`SessionStore`] under an opaque [`SessionHandle`],
//! work on it, and save it back. Callers sharing one handle must serialize
//! their access; stores do no locking.

use std::{
    collections::HashMap,
    fmt,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    derive::default_display_fields,
    error::ReconcileError,
    merge::MergedDataset,
    normalize::{HeaderMap, Normalized, NormalizedRecord},
};

pub const DEFAULT_SESSION: &str = "default";
const MAX_HANDLE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

impl FromStr for SessionHandle {
    type Err = ReconcileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_HANDLE_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ReconcileError::InvalidSession(value.to_string()))
        }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTable {
    pub original_name: String,
    /// SHA-256 of the file contents, hex encoded.
    pub digest: String,
    pub columns: Vec<String>,
    pub header_map: HeaderMap,
    pub records: Vec<NormalizedRecord>,
    pub dropped_rows: usize,
}

impl StoredTable {
    pub fn new(original_name: &str, digest: &str, normalized: Normalized) -> Self {
        let mut columns = normalized
            .records
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect::<Vec<_>>();
        columns.sort();
        columns.dedup();
        Self {
            original_name: original_name.to_string(),
            digest: digest.to_string(),
            columns,
            header_map: normalized.header_map,
            records: normalized.records,
            dropped_rows: normalized.dropped_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedData {
    pub dataset: MergedDataset,
    pub skipped_rows: usize,
    /// Fields the merge was completed with, in display order.
    #[serde(default = "default_display_fields")]
    pub display_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub tables: Vec<StoredTable>,
    pub combined: Option<CombinedData>,
}

impl SessionState {
    pub fn add_table(&mut self, table: StoredTable) {
        self.tables.push(table);
    }

    pub fn contains_digest(&self, digest: &str) -> bool {
        self.tables.iter().any(|t| t.digest == digest)
    }

    pub fn record_sets(&self) -> Vec<&[NormalizedRecord]> {
        self.tables.iter().map(|t| t.records.as_slice()).collect()
    }

    /// Replaces the merged dataset wholesale.
    pub fn set_combined(&mut self, combined: CombinedData) {
        self.combined = Some(combined);
    }
}

pub trait SessionStore {
    fn load(&self, handle: &SessionHandle) -> Result<Option<SessionState>>;
    fn save(&mut self, handle: &SessionHandle, state: &SessionState) -> Result<()>;
    /// Returns whether a session existed.
    fn remove(&mut self, handle: &SessionHandle) -> Result<bool>;

    fn load_or_default(&self, handle: &SessionHandle) -> Result<SessionState> {
        Ok(self.load(handle)?.unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<SessionHandle, SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, handle: &SessionHandle) -> Result<Option<SessionState>> {
        Ok(self.sessions.get(handle).cloned())
    }

    fn save(&mut self, handle: &SessionHandle, state: &SessionState) -> Result<()> {
        self.sessions.insert(handle.clone(), state.clone());
        Ok(())
    }

    fn remove(&mut self, handle: &SessionHandle) -> Result<bool> {
        Ok(self.sessions.remove(handle).is_some())
    }
}

/// One JSON document per session under a state directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, handle: &SessionHandle) -> PathBuf {
        self.root.join(format!("{}.json", handle.as_str()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, handle: &SessionHandle) -> Result<Option<SessionState>> {
        let path = self.path_for(handle);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).with_context(|| format!("Opening session file {path:?}"))?;
        let state = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing session file {path:?}"))?;
        debug!("Loaded session '{}' from {:?}", handle, path);
        Ok(Some(state))
    }

    fn save(&mut self, handle: &SessionHandle, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Creating state directory {:?}", self.root))?;
        let path = self.path_for(handle);
        let staging = path.with_extension("json.tmp");
        {
            let file = File::create(&staging)
                .with_context(|| format!("Creating session file {staging:?}"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, state).context("Writing session JSON")?;
            writer.flush().context("Flushing session JSON")?;
        }
        fs::rename(&staging, &path)
            .with_context(|| format!("Replacing session file {path:?}"))?;
        debug!("Saved session '{}' to {:?}", handle, path);
        Ok(())
    }

    fn remove(&mut self, handle: &SessionHandle) -> Result<bool> {
        let path = self.path_for(handle);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Removing session file {path:?}"))?;
        Ok(true)
    }
}
