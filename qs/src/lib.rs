//! QueryStash - persisted search runs for context-constrained agents
//!
//! Instead of printing full find/grep result sets, each query is written to
//! a uniquely named run directory and only a summary is shown. Stored runs
//! are paged through later on demand.
//!
//! # Architecture
//!
//! ```text
//! _temp/ai_agent/runs/
//! └── {YYYYMMDD_HHMMSS}_{slug}/
//!     ├── results.json     # paths or {path, line_number, content}
//!     └── metadata.json    # tool, query, created_at, count, extras
//! ```
//!
//! # Example
//!
//! ```ignore
//! use querystash::{RunStore, page};
//! use querystash::tools::persist_find;
//!
//! let store = RunStore::new("_temp/ai_agent/runs");
//! let summary = persist_find(&store, "*.rs", ".".as_ref(), &Default::default())?;
//! let (record, results) = store.load(&summary.run_id)?;
//! let first = page(&results, 0, 10, false)?;
//! ```

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod id;
pub mod listing;
pub mod page;
pub mod record;
pub mod search;
mod store;
pub mod tools;

pub use chunk::{Block, Chunk, split};
pub use error::{StoreError, StoreResult};
pub use page::{Page, PageRequest, page};
pub use record::{EntryKind, ResultEntry, RunRecord};
pub use store::{METADATA_FILE, RESULTS_FILE, RunDir, RunStore};

/// Default number of results shown per page
pub const DEFAULT_LIMIT: usize = 10;

/// Default maximum lines per exported transcript file
pub const DEFAULT_EXPORT_MAX_LINES: usize = 500;
