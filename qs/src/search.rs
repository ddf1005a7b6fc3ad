//! File discovery and content search feeding the run store

use std::fs;
use std::path::{Path, PathBuf};

use grep_regex::RegexMatcherBuilder;
use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, SearcherBuilder};
use regex::Regex;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{StoreError, StoreResult};

/// Options shared by find and grep
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Treat the pattern/query as a regular expression
    pub regex: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Directories never walked (e.g. the runs root)
    pub exclude: Vec<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            regex: false,
            recursive: true,
            exclude: Vec::new(),
        }
    }
}

/// A single matching line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMatch {
    pub path: PathBuf,
    pub line_number: u64,
    pub content: String,
}

enum NameMatcher {
    Name(glob::Pattern),
    RelativePath(glob::Pattern),
    Regex(Regex),
}

impl NameMatcher {
    fn new(pattern: &str, regex: bool) -> StoreResult<Self> {
        if regex {
            return Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|e| StoreError::InvalidArgument(format!("invalid regex '{}': {}", pattern, e)));
        }
        let compiled = glob::Pattern::new(pattern)
            .map_err(|e| StoreError::InvalidArgument(format!("invalid glob '{}': {}", pattern, e)))?;
        if pattern.contains('/') {
            Ok(Self::RelativePath(compiled))
        } else {
            Ok(Self::Name(compiled))
        }
    }

    fn is_match(&self, rel: &Path) -> bool {
        match self {
            Self::Name(p) => rel.file_name().and_then(|n| n.to_str()).is_some_and(|n| p.matches(n)),
            Self::RelativePath(p) => p.matches_path(rel),
            Self::Regex(re) => re.is_match(&rel.to_string_lossy().replace('\\', "/")),
        }
    }
}

/// Find files under `root` whose name (or relative path) matches `pattern`
///
/// Returns absolute paths sorted by path.
pub fn find_files(pattern: &str, root: &Path, options: &SearchOptions) -> StoreResult<Vec<PathBuf>> {
    debug!(%pattern, ?root, ?options, "find_files: called");
    let matcher = NameMatcher::new(pattern, options.regex)?;
    let root = resolve_root(root)?;

    let mut found: Vec<PathBuf> = walk_files(&root, options)
        .filter(|e| {
            e.path()
                .strip_prefix(&root)
                .map(|rel| matcher.is_match(rel))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    found.sort();

    debug!(count = found.len(), "find_files: done");
    Ok(found)
}

/// Search file contents under `root` for `query`
///
/// Candidate files are those whose name matches `file_pattern`. The query
/// is literal unless `options.regex` is set. Binary files are skipped.
pub fn grep_content(
    query: &str,
    root: &Path,
    file_pattern: &str,
    options: &SearchOptions,
) -> StoreResult<Vec<ContentMatch>> {
    debug!(%query, ?root, %file_pattern, ?options, "grep_content: called");
    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    let matcher = RegexMatcherBuilder::new()
        .build(&pattern)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid regex '{}': {}", query, e)))?;
    let name_filter = glob::Pattern::new(file_pattern)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid glob '{}': {}", file_pattern, e)))?;

    let root = resolve_root(root)?;
    let mut candidates: Vec<PathBuf> = if root.is_file() {
        vec![root.clone()]
    } else {
        walk_files(&root, options)
            .filter(|e| e.file_name().to_str().is_some_and(|n| name_filter.matches(n)))
            .map(|e| e.into_path())
            .collect()
    };
    candidates.sort();
    debug!(file_count = candidates.len(), "grep_content: files to search");

    let mut searcher = SearcherBuilder::new()
        .binary_detection(BinaryDetection::quit(b'\x00'))
        .line_number(true)
        .build();

    let mut matches = Vec::new();
    for path in candidates {
        let mut file_matches = Vec::new();
        let result = searcher.search_path(
            &matcher,
            &path,
            Lossy(|line_number, line| {
                file_matches.push(ContentMatch {
                    path: path.clone(),
                    line_number,
                    content: line.trim_end().to_string(),
                });
                Ok(true)
            }),
        );

        if let Err(e) = result {
            debug!(?path, %e, "grep_content: read error, keeping matches so far");
        }
        matches.extend(file_matches);
    }

    debug!(count = matches.len(), "grep_content: done");
    Ok(matches)
}

fn resolve_root(root: &Path) -> StoreResult<PathBuf> {
    fs::canonicalize(root)
        .map_err(|e| StoreError::InvalidArgument(format!("search path {}: {}", root.display(), e)))
}

fn walk_files<'a>(root: &'a Path, options: &'a SearchOptions) -> impl Iterator<Item = DirEntry> + 'a {
    let exclude: Vec<PathBuf> = options
        .exclude
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(move |e| {
            if e.depth() == 0 {
                return true;
            }
            if e.file_type().is_dir() && e.file_name() == ".git" {
                return false;
            }
            !exclude.iter().any(|x| e.path().starts_with(x))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
}
