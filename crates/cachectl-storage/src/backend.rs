//! Cache engine trait

use std::path::Path;

use crate::error::StorageError;
use crate::models::{CacheEntry, PolicyRecord};

/// Cache engine trait
///
/// Implementations own the persisted policy records and the cached
/// entries. This tool only reads entries; policies are appended and
/// removed through `add_policy` and `remove_policy`, which persist
/// immediately.
pub trait CacheEngine {
    /// The cache directory, `None` if the cache could not be initialized
    fn directory(&self) -> Option<&Path>;

    /// All live entries, in a stable order
    fn entries(&self) -> Result<Vec<CacheEntry>, StorageError>;

    /// Persisted policy records, in persisted order
    fn policies(&self) -> Vec<PolicyRecord>;

    /// Append a policy record and persist
    fn add_policy(&mut self, record: PolicyRecord) -> Result<(), StorageError>;

    /// Remove the policy with `pattern` and persist, returning it if present
    fn remove_policy(&mut self, pattern: &str) -> Result<Option<PolicyRecord>, StorageError>;
}
