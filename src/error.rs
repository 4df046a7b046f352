use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("could not infer a join key shared by all tables (tried {})", render_candidates(.candidates))]
    KeyInferenceFailed { candidates: Vec<Vec<String>> },
    #[error("no tables have been ingested for session '{session}'")]
    NoTables { session: String },
    #[error("no combined data for session '{session}'; run `combine` first")]
    NoCombinedData { session: String },
    #[error("unsupported file type for {path:?}")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read spreadsheet {path:?}: {message}")]
    Spreadsheet { path: PathBuf, message: String },
    #[error("invalid session handle '{0}'")]
    InvalidSession(String),
}

fn render_candidates(candidates: &[Vec<String>]) -> String {
    if candidates.is_empty() {
        return "no candidates".to_string();
    }
    candidates
        .iter()
        .map(|keys| format!("[{}]", keys.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}
