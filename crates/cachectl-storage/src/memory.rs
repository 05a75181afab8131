//! In-memory cache engine

use std::path::{Path, PathBuf};

use crate::backend::CacheEngine;
use crate::error::StorageError;
use crate::models::{CacheEntry, PolicyRecord};

/// A simple in-memory implementation of CacheEngine for testing
/// or when policies need no persistence
///
/// Entries may still point at real files; only the policy list and the
/// entry list live in memory.
pub struct MemoryCache {
    directory: Option<PathBuf>,
    policies: Vec<PolicyRecord>,
    entries: Vec<CacheEntry>,
}

impl MemoryCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            policies: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// An engine whose cache directory could not be initialized
    pub fn unavailable() -> Self {
        Self {
            directory: None,
            policies: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_policies(mut self, policies: Vec<PolicyRecord>) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_entries(mut self, entries: Vec<CacheEntry>) -> Self {
        self.entries = entries;
        self
    }
}

impl CacheEngine for MemoryCache {
    fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn entries(&self) -> Result<Vec<CacheEntry>, StorageError> {
        Ok(self.entries.clone())
    }

    fn policies(&self) -> Vec<PolicyRecord> {
        self.policies.clone()
    }

    fn add_policy(&mut self, record: PolicyRecord) -> Result<(), StorageError> {
        self.policies.push(record);
        Ok(())
    }

    fn remove_policy(&mut self, pattern: &str) -> Result<Option<PolicyRecord>, StorageError> {
        Ok(self
            .policies
            .iter()
            .position(|p| p.pattern == pattern)
            .map(|idx| self.policies.remove(idx)))
    }
}
