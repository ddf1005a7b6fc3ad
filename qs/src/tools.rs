//! Producer tools: run a search, persist it, report a summary

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::StoreResult;
use crate::record::{ResultEntry, RunRecord};
use crate::search::{SearchOptions, find_files, grep_content};
use crate::store::RunStore;

/// Tool name recorded for discovery runs
pub const FIND_TOOL: &str = "find";

/// Tool name recorded for content-search runs
pub const GREP_TOOL: &str = "grep";

/// What a producer prints instead of its results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub count: usize,
    /// Distinct files with matches (grep only)
    pub file_count: Option<usize>,
    pub results_path: PathBuf,
}

/// Find files and persist the matching paths as a new run
pub fn persist_find(store: &RunStore, pattern: &str, root: &Path, options: &SearchOptions) -> StoreResult<RunSummary> {
    debug!(%pattern, ?root, "persist_find: called");
    let results: Vec<ResultEntry> = find_files(pattern, root, options)?
        .into_iter()
        .map(|p| ResultEntry::path(p.to_string_lossy()))
        .collect();

    let now = Utc::now();
    let dir = store.create_run_dir_at(FIND_TOOL, pattern, now)?;
    let record = RunRecord::new(&dir.run_id, FIND_TOOL, pattern, now, results.len())
        .with_extra("root", root.to_string_lossy().to_string())
        .with_extra("regex", options.regex)
        .with_extra("recursive", options.recursive);
    store.persist(&dir, &record, &results)?;

    Ok(RunSummary {
        run_id: dir.run_id.clone(),
        count: results.len(),
        file_count: None,
        results_path: dir.results_path(),
    })
}

/// Search file contents and persist the matching lines as a new run
pub fn persist_grep(
    store: &RunStore,
    query: &str,
    file_pattern: &str,
    root: &Path,
    options: &SearchOptions,
) -> StoreResult<RunSummary> {
    debug!(%query, %file_pattern, ?root, "persist_grep: called");
    let matches = grep_content(query, root, file_pattern, options)?;
    let files: BTreeSet<&Path> = matches.iter().map(|m| m.path.as_path()).collect();
    let file_count = files.len();

    let results: Vec<ResultEntry> = matches
        .iter()
        .map(|m| ResultEntry::matched(m.path.to_string_lossy(), m.line_number, m.content.clone()))
        .collect();

    let now = Utc::now();
    let dir = store.create_run_dir_at(GREP_TOOL, query, now)?;
    let record = RunRecord::new(&dir.run_id, GREP_TOOL, query, now, results.len())
        .with_extra("root", root.to_string_lossy().to_string())
        .with_extra("file_pattern", file_pattern)
        .with_extra("regex", options.regex)
        .with_extra("recursive", options.recursive)
        .with_extra("file_count", file_count);
    store.persist(&dir, &record, &results)?;

    Ok(RunSummary {
        run_id: dir.run_id.clone(),
        count: results.len(),
        file_count: Some(file_count),
        results_path: dir.results_path(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryKind;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, RunStore) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "alpha\nneedle one\n").unwrap();
        fs::write(temp.path().join("b.txt"), "needle two\nneedle three\n").unwrap();
        fs::write(temp.path().join("c.rs"), "fn needle() {}\n").unwrap();
        let store = RunStore::new(temp.path().join("_temp/ai_agent/runs"));
        (temp, store)
    }

    #[test]
    fn test_persist_find() {
        let (temp, store) = workspace();
        let options = SearchOptions {
            exclude: vec![store.root().to_path_buf()],
            ..Default::default()
        };

        let summary = persist_find(&store, "*.txt", temp.path(), &options).unwrap();
        assert_eq!(summary.count, 2);
        assert!(summary.results_path.is_file());

        let (record, results) = store.load(&summary.run_id).unwrap();
        assert_eq!(record.tool, FIND_TOOL);
        assert_eq!(record.count, 2);
        assert_eq!(record.extra["regex"], false);
        assert!(results.iter().all(|r| r.kind() == EntryKind::Path));
        assert!(results[0].file_path().ends_with("a.txt"));
    }

    #[test]
    fn test_persist_grep_counts_files() {
        let (temp, store) = workspace();
        let options = SearchOptions {
            exclude: vec![store.root().to_path_buf()],
            ..Default::default()
        };

        let summary = persist_grep(&store, "needle", "*.txt", temp.path(), &options).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.file_count, Some(2));

        let (record, results) = store.load(&summary.run_id).unwrap();
        assert_eq!(record.extra["file_count"], 2);
        assert_eq!(record.extra["file_pattern"], "*.txt");
        assert_eq!(
            results[1],
            ResultEntry::matched(results[1].file_path(), 1, "needle two")
        );
    }

    #[test]
    fn test_empty_result_is_still_persisted() {
        let (temp, store) = workspace();

        let summary = persist_find(&store, "*.none", temp.path(), &SearchOptions::default()).unwrap();
        assert_eq!(summary.count, 0);

        let runs = store.list_runs(Some(FIND_TOOL)).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, summary.run_id);
    }

    #[test]
    fn test_run_id_timestamp_matches_created_at() {
        let (temp, store) = workspace();

        let summary = persist_grep(&store, "needle", "*", temp.path(), &SearchOptions::default()).unwrap();

        let (record, _) = store.load(&summary.run_id).unwrap();
        let prefix = record.created_at.format("%Y%m%d_%H%M%S").to_string();
        assert!(summary.run_id.starts_with(&prefix));
    }

    #[test]
    fn test_runs_root_is_not_searched() {
        let (temp, store) = workspace();
        let options = SearchOptions {
            exclude: vec![store.root().to_path_buf()],
            ..Default::default()
        };

        persist_find(&store, "*", temp.path(), &options).unwrap();
        let second = persist_find(&store, "*.json", temp.path(), &options).unwrap();
        assert_eq!(second.count, 0);
    }
}
