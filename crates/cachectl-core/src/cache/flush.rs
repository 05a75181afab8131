//! Flushing entries from the cache
//!
//! Each matching entry is removed in two stages: first its origin record,
//! then its cached copy. The cached copy is only touched once the origin
//! is confirmed gone, so a failed origin delete never leaves a cached file
//! without its record. Failures are per entry; the batch always runs to
//! the end.

use cachectl_storage::CacheEntry;
use regex::Regex;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::policy::compile_pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStage {
    Origin,
    Cache,
}

/// A failed delete, attributed to one entry
#[derive(Error, Debug)]
#[error("Failed to delete: {} ({entry}): {source}", .path.display())]
pub struct DeletionFailure {
    /// Display key of the entry
    pub entry: String,
    pub path: PathBuf,
    pub stage: FlushStage,
    #[source]
    pub source: io::Error,
}

/// Per-entry flush progress
///
/// `Pending → OriginDeleted | OriginAbsent → CacheDeleted | Failed`
#[derive(Debug)]
pub enum FlushState {
    Pending,
    OriginDeleted(PathBuf),
    OriginAbsent,
    CacheDeleted,
    Failed(DeletionFailure),
}

impl FlushState {
    /// Perform the next transition for `entry`
    ///
    /// `shared` is true when the origin and the cached copy are the same
    /// file, in which case deleting the origin also removes the copy.
    pub fn advance(self, entry: &CacheEntry, shared: bool) -> FlushState {
        match self {
            FlushState::Pending => match entry.origin_path() {
                Some(origin) if origin.exists() => match std::fs::remove_file(&origin) {
                    Ok(()) => FlushState::OriginDeleted(origin),
                    Err(source) => FlushState::Failed(DeletionFailure {
                        entry: entry.display_key(),
                        path: origin,
                        stage: FlushStage::Origin,
                        source,
                    }),
                },
                _ => {
                    warn!("Entry did not exist: {}", entry.origin);
                    FlushState::OriginAbsent
                }
            },
            FlushState::OriginDeleted(origin) => {
                if origin.exists() {
                    FlushState::Failed(DeletionFailure {
                        entry: entry.display_key(),
                        path: origin,
                        stage: FlushStage::Origin,
                        source: io::Error::other("origin still present after delete"),
                    })
                } else if shared {
                    FlushState::CacheDeleted
                } else {
                    remove_cached(entry)
                }
            }
            FlushState::OriginAbsent => remove_cached(entry),
            terminal => terminal,
        }
    }
}

fn remove_cached(entry: &CacheEntry) -> FlushState {
    match std::fs::remove_file(&entry.file) {
        Ok(()) => FlushState::CacheDeleted,
        Err(source) => FlushState::Failed(DeletionFailure {
            entry: entry.display_key(),
            path: entry.file.clone(),
            stage: FlushStage::Cache,
            source,
        }),
    }
}

/// Outcome of a flush
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Entries whose display key matched the filter
    pub matched: u64,
    /// Entries whose cached copy was removed
    pub flushed: u64,
    pub failures: Vec<DeletionFailure>,
}

pub struct FlushExecutor {
    filter: Regex,
}

impl FlushExecutor {
    /// Flush entries whose display key matches `filter` (case-insensitive search)
    pub fn new(filter: &str) -> Result<Self, CoreError> {
        Ok(Self {
            filter: compile_pattern(filter)?,
        })
    }

    pub fn matches(&self, entry: &CacheEntry) -> bool {
        self.filter.is_match(&entry.display_key())
    }

    pub fn run(&self, entries: &[CacheEntry]) -> FlushReport {
        let mut report = FlushReport::default();

        for entry in entries.iter().filter(|e| self.matches(e)) {
            report.matched += 1;
            match Self::flush_entry(entry) {
                Ok(()) => {
                    debug!("Flushed {}", entry.display_key());
                    report.flushed += 1;
                }
                Err(failure) => {
                    debug!("Flush failed at {:?} stage: {}", failure.stage, failure.entry);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            "Flushed {} of {} matching entries ({} failed)",
            report.flushed,
            report.matched,
            report.failures.len()
        );
        report
    }

    /// Drive one entry to `CacheDeleted` or `Failed`
    pub fn flush_entry(entry: &CacheEntry) -> Result<(), DeletionFailure> {
        let shared = entry.origin_is_file();
        let mut state = FlushState::Pending;
        loop {
            state = match state {
                FlushState::CacheDeleted => return Ok(()),
                FlushState::Failed(failure) => return Err(failure),
                state => state.advance(entry, shared),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachectl_storage::EntryKind;
    use chrono::Utc;
    use std::path::Path;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("entry")).unwrap();
            std::fs::create_dir_all(dir.path().join("data")).unwrap();
            Self { dir }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        /// An entry with a record file in entry/ and a data file in data/
        fn entry(&self, name: &str, uri: &str) -> CacheEntry {
            let origin = self.path(&format!("entry/{name}.json"));
            let file = self.path(&format!("data/{name}"));
            std::fs::write(&origin, b"{}").unwrap();
            std::fs::write(&file, b"data").unwrap();
            make_entry(uri, file, origin.to_string_lossy().to_string())
        }
    }

    fn make_entry(uri: &str, file: PathBuf, origin: String) -> CacheEntry {
        CacheEntry {
            kind: EntryKind::Uri,
            uri: uri.to_string(),
            file,
            origin,
            cached_at: Utc::now(),
            expired: false,
            content_type: None,
        }
    }

    fn exists(path: &Path) -> bool {
        path.exists()
    }

    #[test]
    fn test_flush_tolerates_one_failure() {
        let fx = Fixture::new();
        let a = fx.entry("a", "http://example.com/a.dtd");
        let b = fx.entry("b", "http://example.com/b.dtd");
        let c = fx.entry("c", "http://example.com/c.dtd");
        let other = fx.entry("d", "http://w3.org/d.xsd");

        // An origin that cannot be removed as a file
        let stuck = fx.path("entry/stuck");
        std::fs::create_dir_all(stuck.join("inner")).unwrap();
        let b = CacheEntry {
            origin: stuck.to_string_lossy().to_string(),
            ..b
        };

        let executor = FlushExecutor::new("EXAMPLE\\.com").unwrap();
        let report = executor.run(&[a.clone(), b.clone(), c.clone(), other.clone()]);

        assert_eq!(report.matched, 3);
        assert_eq!(report.flushed, 2);
        assert_eq!(report.failures.len(), 1);

        let failure = &report.failures[0];
        assert_eq!(failure.entry, "uri http://example.com/b.dtd");
        assert_eq!(failure.path, stuck);
        assert_eq!(failure.stage, FlushStage::Origin);

        assert!(!exists(&a.file) && !exists(&c.file));
        assert!(!exists(&fx.path("entry/a.json")));
        // stage two skipped for the failed entry
        assert!(exists(&b.file));
        // unmatched entry untouched
        assert!(exists(&other.file) && exists(&fx.path("entry/d.json")));
    }

    #[test]
    fn test_absent_origin_still_flushes_cached_copy() {
        let fx = Fixture::new();
        let file = fx.path("data/remote");
        std::fs::write(&file, b"data").unwrap();
        let entry = make_entry(
            "http://example.com/remote",
            file.clone(),
            "http://example.com/remote".to_string(),
        );

        let report = FlushExecutor::new("remote").unwrap().run(&[entry]);
        assert_eq!(report.flushed, 1);
        assert!(report.failures.is_empty());
        assert!(!file.exists());
    }

    #[test]
    fn test_origin_same_as_cached_copy() {
        let fx = Fixture::new();
        let file = fx.path("data/shared");
        std::fs::write(&file, b"data").unwrap();
        let entry = make_entry(
            "http://example.com/shared",
            file.clone(),
            file.to_string_lossy().to_string(),
        );

        assert!(FlushExecutor::flush_entry(&entry).is_ok());
        assert!(!file.exists());
    }

    #[test]
    fn test_missing_cached_copy_is_failure() {
        let fx = Fixture::new();
        let entry = make_entry(
            "http://example.com/gone",
            fx.path("data/gone"),
            "http://example.com/gone".to_string(),
        );

        let report = FlushExecutor::new(".*").unwrap().run(&[entry]);
        assert_eq!(report.flushed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FlushStage::Cache);
    }

    #[test]
    fn test_state_transitions() {
        let fx = Fixture::new();
        let entry = fx.entry("a", "http://example.com/a");
        let origin = fx.path("entry/a.json");

        let state = FlushState::Pending.advance(&entry, false);
        assert!(matches!(&state, FlushState::OriginDeleted(p) if *p == origin));

        let state = state.advance(&entry, false);
        assert!(matches!(state, FlushState::CacheDeleted));

        let state = state.advance(&entry, false);
        assert!(matches!(state, FlushState::CacheDeleted));
    }

    #[test]
    fn test_filter_matches_display_key_only() {
        let fx = Fixture::new();
        let entry = fx.entry("a", "http://example.com/a");

        // the cached file path is not part of the display key
        let executor = FlushExecutor::new("data").unwrap();
        assert!(!executor.matches(&entry));
        assert!(FlushExecutor::new("^uri ").unwrap().matches(&entry));
    }
}
