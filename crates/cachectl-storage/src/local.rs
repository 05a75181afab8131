//! Local cache directory engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::CacheEngine;
use crate::error::StorageError;
use crate::models::{CacheEntry, EntryKind, PolicyRecord};

/// File holding the persisted policies, relative to the cache directory
pub const POLICY_FILE: &str = "cache.toml";

/// Directory holding one JSON record per cached entry
pub const ENTRY_DIR: &str = "entry";

/// Local cache directory engine
///
/// Layout:
/// - `<base_path>/cache.toml`: `[[policy]]` tables in persisted order
/// - `<base_path>/entry/*.json`: one record per cached entry
///
/// Paths inside entry records are resolved against the base path when
/// relative. A record without an `origin` uses the record file itself.
pub struct LocalCache {
    base_path: PathBuf,
    policy_path: PathBuf,
    entries_path: PathBuf,
    policies: Vec<PolicyRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    policy: Vec<PolicyRecord>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    #[serde(default)]
    kind: EntryKind,
    uri: String,
    file: PathBuf,
    #[serde(default)]
    origin: Option<String>,
    cached_at: DateTime<Utc>,
    #[serde(default)]
    expired: bool,
    #[serde(default)]
    content_type: Option<String>,
}

impl LocalCache {
    /// Open an existing cache directory
    ///
    /// The directory is never created here.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref();
        if !base_path.is_dir() {
            return Err(StorageError::NotADirectory(base_path.to_path_buf()));
        }
        let base_path = base_path.canonicalize()?;
        let policy_path = base_path.join(POLICY_FILE);
        let entries_path = base_path.join(ENTRY_DIR);
        let policies = Self::load_policies(&policy_path)?;

        info!(
            "Opened cache at {:?} ({} policies)",
            base_path,
            policies.len()
        );

        Ok(Self {
            base_path,
            policy_path,
            entries_path,
            policies,
        })
    }

    fn load_policies(path: &Path) -> Result<Vec<PolicyRecord>, StorageError> {
        if !path.exists() {
            debug!("No policy file at {:?}", path);
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)?;
        let file: PolicyFile =
            toml::from_str(&content).map_err(|source| StorageError::PolicyFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(file.policy)
    }

    /// Write the policy file atomically (temp file in the same directory, then rename)
    fn save_policies(&self) -> Result<(), StorageError> {
        let content = toml::to_string_pretty(&PolicyFile {
            policy: self.policies.clone(),
        })?;

        let temp_file = tempfile::NamedTempFile::new_in(&self.base_path)?;
        {
            let mut file = temp_file.as_file();
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        temp_file.persist(&self.policy_path)?;

        debug!("Saved {} policies to {:?}", self.policies.len(), self.policy_path);
        Ok(())
    }

    fn read_entry(&self, path: &Path) -> Result<CacheEntry, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let record: EntryRecord = serde_json::from_str(&content).map_err(|e| e.to_string())?;

        let file = self.resolve(&record.file);
        let origin = match record.origin {
            Some(origin) if Url::parse(&origin).is_ok() => origin,
            Some(origin) => self.resolve(Path::new(&origin)).to_string_lossy().to_string(),
            None => Url::from_file_path(path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.to_string_lossy().to_string()),
        };

        Ok(CacheEntry {
            kind: record.kind,
            uri: record.uri,
            file,
            origin,
            cached_at: record.cached_at,
            expired: record.expired,
            content_type: record.content_type,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

impl CacheEngine for LocalCache {
    fn directory(&self) -> Option<&Path> {
        Some(&self.base_path)
    }

    fn entries(&self) -> Result<Vec<CacheEntry>, StorageError> {
        if !self.entries_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.entries_path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read_entry(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping unreadable entry record {:?}: {}", path, e),
            }
        }
        Ok(entries)
    }

    fn policies(&self) -> Vec<PolicyRecord> {
        self.policies.clone()
    }

    fn add_policy(&mut self, record: PolicyRecord) -> Result<(), StorageError> {
        debug!("Adding policy {}", record.pattern);
        self.policies.push(record);
        self.save_policies()
    }

    fn remove_policy(&mut self, pattern: &str) -> Result<Option<PolicyRecord>, StorageError> {
        let Some(idx) = self.policies.iter().position(|p| p.pattern == pattern) else {
            return Ok(None);
        };
        debug!("Removing policy {}", pattern);
        let removed = self.policies.remove(idx);
        self.save_policies()?;
        Ok(Some(removed))
    }
}
