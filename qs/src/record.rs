//! Run metadata and result entry types

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Top-level `metadata.json` keys that extras may not reuse
pub const RESERVED_FIELDS: [&str; 5] = ["run_id", "tool", "query", "created_at", "count"];

/// Metadata for a single persisted run (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique, time-sortable run ID (also the directory name)
    pub run_id: String,
    /// Producer tool name (`find`, `grep`, ...)
    pub tool: String,
    /// Query string as given by the caller
    pub query: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Number of result entries; always equal to the stored result length
    pub count: usize,
    /// Tool-specific extras, flattened into the top-level object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunRecord {
    pub fn new(
        run_id: impl Into<String>,
        tool: impl Into<String>,
        query: impl Into<String>,
        created_at: DateTime<Utc>,
        count: usize,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            tool: tool.into(),
            query: query.into(),
            created_at,
            count,
            extra: Map::new(),
        }
    }

    /// Add a tool-specific extra field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// First extra key that collides with a fixed metadata field
    pub fn reserved_extra(&self) -> Option<&str> {
        self.extra
            .keys()
            .map(String::as_str)
            .find(|k| RESERVED_FIELDS.contains(k))
    }
}

/// Which producer shape a result entry has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Path,
    Match,
}

/// A single stored result
///
/// Discovery runs store plain paths; content-search runs store matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEntry {
    Path { path: String },
    Match { path: String, line_number: u64, content: String },
}

impl ResultEntry {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path { path: path.into() }
    }

    pub fn matched(path: impl Into<String>, line_number: u64, content: impl Into<String>) -> Self {
        Self::Match {
            path: path.into(),
            line_number,
            content: content.into(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Path { .. } => EntryKind::Path,
            Self::Match { .. } => EntryKind::Match,
        }
    }

    /// Absolute path the entry refers to
    pub fn file_path(&self) -> &str {
        match self {
            Self::Path { path } | Self::Match { path, .. } => path,
        }
    }
}

/// Check that all entries share one variant
pub fn single_kind(entries: &[ResultEntry]) -> Option<EntryKind> {
    let first = entries.first()?.kind();
    entries.iter().all(|e| e.kind() == first).then_some(first)
}

#[derive(Serialize)]
struct MatchRef<'a> {
    path: &'a str,
    line_number: u64,
    content: &'a str,
}

impl Serialize for ResultEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Path { path } => serializer.serialize_str(path),
            Self::Match {
                path,
                line_number,
                content,
            } => MatchRef {
                path,
                line_number: *line_number,
                content,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResultEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ResultEntry::try_from(value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for ResultEntry {
    type Error = String;

    /// The presence of `line_number` is the discriminator
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(path) => Ok(Self::Path { path }),
            Value::Object(mut obj) => {
                let path = match obj.remove("path") {
                    Some(Value::String(p)) => p,
                    _ => return Err("result object is missing a string `path`".to_string()),
                };
                match obj.remove("line_number") {
                    None => Ok(Self::Path { path }),
                    Some(line) => {
                        let line_number = line
                            .as_u64()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| format!("invalid line_number for {}", path))?;
                        let content = match obj.remove("content") {
                            Some(Value::String(c)) => c,
                            None | Some(Value::Null) => String::new(),
                            Some(_) => return Err(format!("invalid content for {}:{}", path, line_number)),
                        };
                        Ok(Self::Match {
                            path,
                            line_number,
                            content,
                        })
                    }
                }
            }
            other => Err(format!("unexpected result element: {}", other)),
        }
    }
}
