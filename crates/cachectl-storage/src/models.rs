//! Cache engine models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::defaults;

/// Relation marker separating an entry's key from its cached file
pub const RARR: &str = "→";

/// Catalog entry kind of a cached resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Uri,
    System,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Uri => "uri",
            EntryKind::System => "system",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached resource as seen by this tool
///
/// Entries are owned by the cache engine. `file` is the locally cached
/// copy; `origin` points at the record the entry was created from, which
/// may be the same file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub kind: EntryKind,
    pub uri: String,
    pub file: PathBuf,
    pub origin: String,
    pub cached_at: DateTime<Utc>,
    pub expired: bool,
    pub content_type: Option<String>,
}

impl CacheEntry {
    /// Byte length of the cached copy, 0 if it cannot be read
    pub fn len(&self) -> u64 {
        std::fs::metadata(&self.file).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry text up to the relation marker, e.g. `uri http://example.com/a.dtd`
    pub fn display_key(&self) -> String {
        let text = self.to_string();
        match text.find(RARR) {
            Some(pos) => text[..pos].trim_end().to_string(),
            None => text,
        }
    }

    /// Resolve the origin reference to a local path
    ///
    /// `file:` URLs and bare paths resolve; any other scheme has no
    /// local counterpart.
    pub fn origin_path(&self) -> Option<PathBuf> {
        match Url::parse(&self.origin) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Ok(_) => None,
            Err(_) => Some(PathBuf::from(&self.origin)),
        }
    }

    /// Whether the origin reference and the cached copy are the same file
    pub fn origin_is_file(&self) -> bool {
        self.origin_path()
            .map(|p| same_path(&p, &self.file))
            .unwrap_or(false)
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.kind,
            self.uri,
            RARR,
            self.file.display()
        )
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Persisted form of a cache policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Regular expression over resource URIs
    pub pattern: String,
    /// Whether matching resources are cached at all
    #[serde(default = "default_include")]
    pub include: bool,
    /// Entry count limit; negative is unbounded
    #[serde(default = "default_max_entries")]
    pub max_entries: i64,
    /// Space limit in bytes; negative is unbounded
    #[serde(default = "default_max_space")]
    pub max_space: i64,
    /// Maximum age in seconds; negative is unlimited
    #[serde(default = "default_max_age")]
    pub max_age: i64,
    /// Grace period in seconds before a deleted entry is purged
    #[serde(default = "default_delete_wait")]
    pub delete_wait: i64,
}

impl PolicyRecord {
    /// A policy with the system default limits
    pub fn new(pattern: impl Into<String>, include: bool) -> Self {
        Self {
            pattern: pattern.into(),
            include,
            max_entries: defaults::CACHE_SIZE,
            max_space: defaults::CACHE_SPACE,
            max_age: defaults::MAX_AGE,
            delete_wait: defaults::DELETE_WAIT,
        }
    }
}

fn default_include() -> bool {
    true
}

fn default_max_entries() -> i64 {
    defaults::CACHE_SIZE
}

fn default_max_space() -> i64 {
    defaults::CACHE_SPACE
}

fn default_max_age() -> i64 {
    defaults::MAX_AGE
}

fn default_delete_wait() -> i64 {
    defaults::DELETE_WAIT
}
