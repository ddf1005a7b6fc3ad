//! Run store: one write-once directory per persisted query run
//!
//! ```text
//! {runs_root}/
//! └── {run_id}/
//!     ├── results.json     # written first
//!     └── metadata.json    # written last; marks the run complete
//! ```

mod reader;
mod writer;

use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::id::{generate_run_id, with_suffix};

/// Metadata file name inside a run directory
pub const METADATA_FILE: &str = "metadata.json";

/// Results file name inside a run directory
pub const RESULTS_FILE: &str = "results.json";

/// Upper bound on collision suffixes tried for one candidate ID
const MAX_CREATE_ATTEMPTS: u32 = 10_000;

/// Handle to a freshly created run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    pub run_id: String,
    pub path: PathBuf,
}

impl RunDir {
    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.path.join(RESULTS_FILE)
    }
}

/// File-backed store of query runs
#[derive(Debug, Clone)]
pub struct RunStore {
    /// Directory holding one subdirectory per run
    root: PathBuf,
}

impl RunStore {
    /// Create a store handle; no I/O happens until a run is created or read
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, empty run directory for `(tool, query)` at the current time
    pub fn create_run_dir(&self, tool: &str, query: &str) -> StoreResult<RunDir> {
        self.create_run_dir_at(tool, query, Utc::now())
    }

    /// Create a new, empty run directory using an explicit creation time
    ///
    /// Directory creation is the atomic claim: a name that already exists
    /// (same second, same slug, possibly another process) is skipped and the
    /// next numeric suffix is tried.
    pub fn create_run_dir_at(&self, tool: &str, query: &str, now: DateTime<Utc>) -> StoreResult<RunDir> {
        debug!(%tool, %query, root = ?self.root, "create_run_dir_at: called");
        fs::create_dir_all(&self.root).map_err(|e| StoreError::storage(&self.root, e))?;

        let candidate = generate_run_id(tool, query, &now);
        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let run_id = with_suffix(&candidate, attempt);
            let path = self.root.join(&run_id);
            match fs::create_dir(&path) {
                Ok(()) => {
                    info!(%run_id, "Created run directory");
                    return Ok(RunDir { run_id, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(%run_id, "create_run_dir_at: name taken, trying next suffix");
                }
                Err(e) => return Err(StoreError::storage(path, e)),
            }
        }

        Err(StoreError::Storage {
            path: self.root.join(&candidate),
            reason: format!("no free run id after {} attempts", MAX_CREATE_ATTEMPTS),
            source: None,
        })
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }
}
