//! Configuration for querystash

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runs root relative to the workspace root when not configured
pub const DEFAULT_RUNS_DIR: &str = "_temp/ai_agent/runs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace root; discovered from the current directory when unset
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Directory holding persisted runs; relative paths are joined to the workspace root
    #[serde(default)]
    pub runs_root: Option<PathBuf>,

    /// Results shown per page by `view`
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum lines per exported transcript file
    #[serde(default = "default_export_max_lines")]
    pub export_max_lines: usize,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_limit() -> usize {
    crate::DEFAULT_LIMIT
}

fn default_export_max_lines() -> usize {
    crate::DEFAULT_EXPORT_MAX_LINES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_root: None,
            runs_root: None,
            default_limit: default_limit(),
            export_max_lines: default_export_max_lines(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("querystash").join("config.yml")),
            Some(PathBuf::from("querystash.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Config::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))?;
        debug!(?path, "Config::load_from: loaded");
        Ok(config)
    }

    /// Resolve the workspace root: explicit override, config, enclosing git repo, then `cwd`
    pub fn resolve_workspace_root(&self, cli_override: Option<&Path>, cwd: &Path) -> PathBuf {
        if let Some(root) = cli_override.or(self.workspace_root.as_deref()) {
            return absolutize(root, cwd);
        }
        find_repo_root(cwd).unwrap_or_else(|| cwd.to_path_buf())
    }

    /// Directory where runs are stored for `workspace_root`
    pub fn runs_root(&self, workspace_root: &Path) -> PathBuf {
        match &self.runs_root {
            Some(root) => absolutize(root, workspace_root),
            None => workspace_root.join(DEFAULT_RUNS_DIR),
        }
    }
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Nearest ancestor of `start` (inclusive) containing `.git`
fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
