//! Directory listing with modification-date filters

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// How a file's modification date is compared to the filter date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DateMode {
    /// Same calendar day
    #[default]
    Eq,
    /// Strictly after
    Gt,
    /// Strictly before
    Lt,
}

/// Filter on the local calendar date of the modification time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub date: NaiveDate,
    pub mode: DateMode,
}

impl DateFilter {
    /// Parse a `YYYY-MM-DD` date
    pub fn parse(date: &str, mode: DateMode) -> StoreResult<Self> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| StoreError::InvalidArgument(format!("invalid date '{}', use YYYY-MM-DD", date)))?;
        Ok(Self { date, mode })
    }

    pub fn matches(&self, modified: &DateTime<Local>) -> bool {
        let day = modified.date_naive();
        match self.mode {
            DateMode::Eq => day == self.date,
            DateMode::Gt => day > self.date,
            DateMode::Lt => day < self.date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub pattern: String,
    pub recursive: bool,
    pub include_dirs: bool,
    pub date: Option<DateFilter>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            pattern: "*".to_string(),
            recursive: false,
            include_dirs: false,
            date: None,
        }
    }
}

/// One listed entry
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub mtime: DateTime<Local>,
}

/// List entries under `root` whose name matches the glob
pub fn list_files(root: &Path, options: &ListOptions) -> StoreResult<Vec<FileInfo>> {
    debug!(?root, ?options, "list_files: called");
    let pattern = glob::Pattern::new(&options.pattern)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid glob '{}': {}", options.pattern, e)))?;
    if !root.is_dir() {
        return Err(StoreError::InvalidArgument(format!("not a directory: {}", root.display())));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut listed = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let is_dir = entry.file_type().is_dir();
        if is_dir && !options.include_dirs {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !pattern.matches(name) {
            continue;
        }

        let meta = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = ?entry.path(), %e, "list_files: skipping unreadable entry");
                continue;
            }
        };
        let mtime: DateTime<Local> = match meta.modified() {
            Ok(t) => t.into(),
            Err(_) => continue,
        };
        if let Some(filter) = &options.date
            && !filter.matches(&mtime)
        {
            continue;
        }

        listed.push(FileInfo {
            path: entry.path().to_string_lossy().to_string(),
            name: name.to_string(),
            size: meta.len(),
            mtime,
        });
    }

    debug!(count = listed.len(), "list_files: done");
    Ok(listed)
}
