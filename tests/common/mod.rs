#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

pub const BIN: &str = "table-reconcile";

/// Scratch directory holding input files and the session state for one test.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp_dir.path().join("state")
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// The binary, pointed at this workspace's state directory.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin(BIN).expect("binary exists");
        cmd.current_dir(self.path())
            .env("TABLE_RECONCILE_STATE_DIR", self.state_dir())
            .env_remove("RUST_LOG");
        cmd
    }
}

/// CRM export keyed by a spaced, mixed-case organisation id header.
pub const CRM_CSV: &str = "\
Org ID,Client,Contact Name,Engagement Status,Carbon Factor
1,Acme,Alice,Active,10
2,Globex,Bob,,abc
,,,,
3,Initech,Carol,Active,\"20,000\"
";

/// Sustainability export sharing organisation ids with [`CRM_CSV`].
pub const ESG_CSV: &str = "\
organisation_id,Product Status,Carbon Factor,Next Activity Due Date
1,Live,99,2024-01-01
2,Pilot,,
4,Live,,03/04/2024
,Live,5,
";
