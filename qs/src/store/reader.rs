//! Result reader: load one run, or enumerate all completed runs

use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use super::{METADATA_FILE, RESULTS_FILE, RunStore};
use crate::error::{StoreError, StoreResult};
use crate::id::is_safe_run_id;
use crate::record::{ResultEntry, RunRecord, single_kind};

impl RunStore {
    /// Load a completed run's metadata and results
    pub fn load(&self, run_id: &str) -> StoreResult<(RunRecord, Vec<ResultEntry>)> {
        debug!(%run_id, "load: called");
        if !is_safe_run_id(run_id) {
            return Err(StoreError::InvalidArgument(format!("invalid run id: {}", run_id)));
        }

        let run_path = self.run_path(run_id);
        let metadata_path = run_path.join(METADATA_FILE);
        if !metadata_path.is_file() {
            debug!(%run_id, "load: no metadata, run missing or incomplete");
            return Err(StoreError::NotFound {
                run_id: run_id.to_string(),
            });
        }

        let record: RunRecord = read_json(&metadata_path)?;
        if record.run_id != run_id {
            return Err(StoreError::corrupt(
                &metadata_path,
                format!("metadata names run {}", record.run_id),
            ));
        }

        let results_path = run_path.join(RESULTS_FILE);
        let results: Vec<ResultEntry> = read_json(&results_path)?;

        if record.count != results.len() {
            return Err(StoreError::corrupt(
                &metadata_path,
                format!("count {} does not match {} results", record.count, results.len()),
            ));
        }
        if !results.is_empty() && single_kind(&results).is_none() {
            return Err(StoreError::corrupt(&results_path, "results mix paths and matches"));
        }

        Ok((record, results))
    }

    /// List completed runs, newest first
    ///
    /// Runs with missing or unreadable metadata are skipped, never fatal.
    pub fn list_runs(&self, tool_filter: Option<&str>) -> StoreResult<Vec<RunRecord>> {
        debug!(?tool_filter, root = ?self.root, "list_runs: called");
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage(&self.root, e)),
        };

        let mut runs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let metadata_path = path.join(METADATA_FILE);
            if !metadata_path.is_file() {
                debug!(?path, "list_runs: skipping incomplete run");
                continue;
            }

            match read_json::<RunRecord>(&metadata_path) {
                Ok(record) => {
                    if tool_filter.is_none_or(|tool| record.tool == tool) {
                        runs.push(record);
                    }
                }
                Err(e) => {
                    warn!(?path, %e, "Skipping unreadable run");
                }
            }
        }

        runs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.run_id.cmp(&a.run_id))
        });
        Ok(runs)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::corrupt(path, format!("unreadable: {}", e)))?;
    serde_json::from_str(&content).map_err(|e| StoreError::corrupt(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RESERVED_FIELDS;
    use crate::store::RunDir;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::{Map, Value};
    use tempfile::TempDir;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 12).unwrap()
    }

    fn persist_run(store: &RunStore, tool: &str, query: &str, at: DateTime<Utc>, results: Vec<ResultEntry>) -> RunDir {
        let dir = store.create_run_dir_at(tool, query, at).unwrap();
        let record = RunRecord::new(&dir.run_id, tool, query, at, results.len());
        store.persist(&dir, &record, &results).unwrap();
        dir
    }

    #[test]
    fn test_find_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        let results = vec![ResultEntry::path("/a.txt"), ResultEntry::path("/b.txt")];
        let dir = persist_run(&store, "find", "*.txt", base_time(), results.clone());

        let (record, loaded) = store.load(&dir.run_id).unwrap();

        assert_eq!(loaded, results);
        assert_eq!(record.count, 2);
        assert_eq!(record.tool, "find");
        assert_eq!(record.query, "*.txt");
    }

    #[test]
    fn test_grep_round_trip_with_extras() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        let dir = store.create_run_dir_at("grep", "TODO", base_time()).unwrap();
        let results = vec![
            ResultEntry::matched("/src/a.rs", 3, "// TODO: one"),
            ResultEntry::matched("/src/b.rs", 10, "    todo!() // TODO"),
        ];
        let record = RunRecord::new(&dir.run_id, "grep", "TODO", base_time(), 2)
            .with_extra("file_pattern", "*.rs")
            .with_extra("file_count", 2);
        store.persist(&dir, &record, &results).unwrap();

        let (loaded_record, loaded) = store.load(&dir.run_id).unwrap();
        assert_eq!(loaded_record, record);
        assert_eq!(loaded, results);
    }

    #[test]
    fn test_load_missing_run() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());

        let err = store.load("20260314_093012_nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_load_incomplete_run_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        let dir = store.create_run_dir("find", "x").unwrap();

        let err = store.load(&dir.run_id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_load_rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path().join("runs"));

        let err = store.load("../outside").unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_load_count_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        let dir = persist_run(&store, "find", "x", base_time(), vec![ResultEntry::path("/a")]);
        fs::write(dir.results_path(), r#"["/a", "/b"]"#).unwrap();

        let err = store.load(&dir.run_id).unwrap_err();
        assert!(matches!(err, StoreError::CorruptData { .. }));
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        let dir = persist_run(&store, "find", "x", base_time(), vec![]);
        fs::write(dir.metadata_path(), "{ not json").unwrap();

        let err = store.load(&dir.run_id).unwrap_err();
        assert!(matches!(err, StoreError::CorruptData { .. }));
    }

    #[test]
    fn test_list_runs_newest_first() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        persist_run(&store, "find", "one", base_time(), vec![]);
        persist_run(&store, "grep", "two", base_time() + Duration::seconds(5), vec![]);
        persist_run(&store, "find", "three", base_time() + Duration::seconds(2), vec![]);

        let runs = store.list_runs(None).unwrap();
        let queries: Vec<&str> = runs.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["two", "three", "one"]);
        assert!(runs.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_list_runs_tool_filter() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        persist_run(&store, "find", "a", base_time(), vec![]);
        persist_run(&store, "grep", "b", base_time() + Duration::seconds(1), vec![]);
        persist_run(&store, "find", "c", base_time() + Duration::seconds(2), vec![]);

        let runs = store.list_runs(Some("find")).unwrap();
        let queries: Vec<&str> = runs.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["c", "a"]);
        assert!(runs.iter().all(|r| r.tool == "find"));

        assert!(store.list_runs(Some("view")).unwrap().is_empty());
    }

    #[test]
    fn test_list_runs_skips_bad_runs() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path());
        persist_run(&store, "find", "good", base_time(), vec![]);
        let bad = persist_run(&store, "find", "bad", base_time() + Duration::seconds(1), vec![]);
        fs::write(bad.metadata_path(), "garbage").unwrap();
        store.create_run_dir("find", "incomplete").unwrap();
        fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let runs = store.list_runs(None).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].query, "good");
    }

    #[test]
    fn test_list_runs_missing_root() {
        let temp = TempDir::new().unwrap();
        let store = RunStore::new(temp.path().join("never-created"));
        assert!(store.list_runs(None).unwrap().is_empty());
    }

    fn query_strategy() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[!@#$%^&*(). -]{1,12}", any::<String>()]
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<ResultEntry>> {
        prop_oneof![
            prop::collection::vec(any::<String>().prop_map(ResultEntry::path), 0..8),
            prop::collection::vec(
                (any::<String>(), any::<u64>(), any::<String>()).prop_map(|(p, n, c)| ResultEntry::matched(p, n, c)),
                0..8,
            ),
        ]
    }

    fn extras_strategy() -> impl Strategy<Value = Map<String, Value>> {
        let key = "[a-z_]{1,12}".prop_filter("fixed metadata field", |k| !RESERVED_FIELDS.contains(&k.as_str()));
        let value = prop_oneof![
            any::<String>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ];
        prop::collection::btree_map(key, value, 0..5).prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_load_returns_what_was_persisted(
            tool in "[a-z]{1,8}",
            query in query_strategy(),
            secs in 0i64..4_000_000_000,
            nanos in 0u32..1_000_000_000,
            results in entries_strategy(),
            extra in extras_strategy(),
        ) {
            let temp = TempDir::new().unwrap();
            let store = RunStore::new(temp.path());
            let at = Utc.timestamp_opt(secs, nanos).unwrap();
            let dir = store.create_run_dir_at(&tool, &query, at).unwrap();
            let mut record = RunRecord::new(&dir.run_id, &tool, &query, at, results.len());
            record.extra = extra;

            store.persist(&dir, &record, &results).unwrap();
            let (loaded_record, loaded_results) = store.load(&dir.run_id).unwrap();

            prop_assert_eq!(&loaded_record, &record);
            prop_assert_eq!(&loaded_results, &results);
            prop_assert_eq!(store.list_runs(None).unwrap(), vec![record]);
        }
    }
}
