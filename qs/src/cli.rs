//! CLI argument parsing for querystash

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::listing::DateMode;

#[derive(Parser, Debug)]
#[command(name = "qs")]
#[command(
    author,
    version,
    about = "Persist find/grep results to disk and page through them on demand",
    long_about = None
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace root (default: enclosing git repository or current directory)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find files by glob or regex and persist the matches as a run
    Find {
        /// Search pattern (glob, or regex with --regex)
        pattern: String,

        /// Directory to search (default: workspace root)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Use regex pattern matching on the relative path
        #[arg(long)]
        regex: bool,

        /// Search non-recursively
        #[arg(long = "no-recursive", action = clap::ArgAction::SetFalse)]
        recursive: bool,
    },

    /// Search file contents and persist the matching lines as a run
    Grep {
        /// Search string (regex with --regex)
        query: String,

        /// Glob pattern for candidate file names
        #[arg(default_value = "*")]
        file_pattern: String,

        /// Directory to search (default: workspace root)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Treat the query as a regex
        #[arg(long)]
        regex: bool,

        /// Search non-recursively
        #[arg(long = "no-recursive", action = clap::ArgAction::SetFalse)]
        recursive: bool,
    },

    /// List persisted runs or page through one run's results
    View {
        /// Run ID to inspect (omit to list runs)
        run_id: Option<String>,

        /// List all persisted runs
        #[arg(long)]
        list: bool,

        /// Only runs produced by this tool (find, grep)
        #[arg(long)]
        tool: Option<String>,

        /// Number of results to show (default: 10)
        #[arg(long)]
        limit: Option<usize>,

        /// Starting index for results
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Show all results from the offset on
        #[arg(long)]
        full: bool,
    },

    /// List directory entries, optionally filtered by modification date
    Ls {
        /// Root directory to list
        root: PathBuf,

        /// Glob pattern for entry names
        #[arg(long, default_value = "*")]
        pattern: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Include directories
        #[arg(long)]
        dirs: bool,

        /// Filter by modification date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Date comparison mode
        #[arg(long, value_enum, default_value_t = DateMode::Eq)]
        mode: DateMode,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a chat session JSON file to size-capped markdown files
    Export {
        /// Chat session JSON file
        source: PathBuf,

        /// Output markdown file (parts are named <stem>_partNNN<ext>)
        #[arg(short, long, default_value = "chat_history.md")]
        output: PathBuf,

        /// Maximum lines per output file (default: 500)
        #[arg(short, long)]
        max_lines: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_defaults() {
        let cli = Cli::try_parse_from(["qs", "find", "*.rs"]).unwrap();
        match cli.command {
            Command::Find {
                pattern,
                regex,
                recursive,
                path,
            } => {
                assert_eq!(pattern, "*.rs");
                assert!(!regex);
                assert!(recursive);
                assert!(path.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_recursive_flag() {
        let cli = Cli::try_parse_from(["qs", "grep", "TODO", "*.rs", "--no-recursive"]).unwrap();
        match cli.command {
            Command::Grep {
                file_pattern,
                recursive,
                ..
            } => {
                assert_eq!(file_pattern, "*.rs");
                assert!(!recursive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_view_flags() {
        let cli = Cli::try_parse_from(["qs", "view", "20260314_093012_x", "--offset", "10", "--limit", "5"]).unwrap();
        match cli.command {
            Command::View {
                run_id,
                offset,
                limit,
                full,
                list,
                ..
            } => {
                assert_eq!(run_id.as_deref(), Some("20260314_093012_x"));
                assert_eq!(offset, 10);
                assert_eq!(limit, Some(5));
                assert!(!full && !list);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_offset_rejected() {
        assert!(Cli::try_parse_from(["qs", "view", "x", "--offset", "-1"]).is_err());
    }

    #[test]
    fn test_ls_mode() {
        let cli = Cli::try_parse_from(["qs", "ls", ".", "--date", "2026-03-14", "--mode", "gt"]).unwrap();
        match cli.command {
            Command::Ls { mode, date, .. } => {
                assert_eq!(mode, DateMode::Gt);
                assert_eq!(date.as_deref(), Some("2026-03-14"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
