//! Result writer: results first, metadata last, each via temp file + rename

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use super::{RunDir, RunStore};
use crate::error::{StoreError, StoreResult};
use crate::record::{ResultEntry, RunRecord, single_kind};

impl RunStore {
    /// Persist a run's metadata and results into its directory
    ///
    /// `metadata.json` appears only after `results.json` is fully on disk,
    /// so readers never see metadata without results.
    pub fn persist(&self, dir: &RunDir, record: &RunRecord, results: &[ResultEntry]) -> StoreResult<()> {
        debug!(run_id = %dir.run_id, count = results.len(), "persist: called");
        let run_id = dir.run_id.as_str();

        if !dir.path.is_dir() {
            return Err(StoreError::persistence(run_id, "run directory is missing"));
        }
        if dir.metadata_path().exists() {
            return Err(StoreError::persistence(run_id, "run is already finalized"));
        }
        if record.run_id != dir.run_id {
            return Err(StoreError::persistence(
                run_id,
                format!("metadata names run {}", record.run_id),
            ));
        }
        if record.count != results.len() {
            return Err(StoreError::persistence(
                run_id,
                format!("count {} does not match {} results", record.count, results.len()),
            ));
        }
        if let Some(key) = record.reserved_extra() {
            return Err(StoreError::persistence(
                run_id,
                format!("extra field '{}' shadows a metadata field", key),
            ));
        }
        if !results.is_empty() && single_kind(results).is_none() {
            return Err(StoreError::persistence(run_id, "results mix paths and matches"));
        }

        write_json_atomic(run_id, &dir.results_path(), results)?;
        write_json_atomic(run_id, &dir.metadata_path(), record)?;

        info!(%run_id, count = record.count, tool = %record.tool, "Persisted run");
        Ok(())
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(run_id: &str, path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::persistence(run_id, format!("failed to serialize: {}", e)))?;

    let tmp = path.with_extension("json.tmp");
    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&content)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    written.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::persistence_io(run_id, &format!("failed to write {}", path.display()), e)
    })
}
