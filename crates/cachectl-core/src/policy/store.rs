//! Ordered policy store

use cachectl_storage::{CacheEngine, PolicyRecord};
use tracing::info;

use super::CachePolicy;
use crate::error::CoreError;

/// Ordered set of cache policies backed by a cache engine
///
/// Order is persisted order and is significant: classification is
/// first-match-wins.
pub struct PolicyStore<E> {
    engine: E,
}

impl<E: CacheEngine> PolicyStore<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.engine.policies().iter().any(|p| p.pattern == pattern)
    }

    /// Persisted policies, in persisted order
    pub fn list(&self) -> Result<Vec<CachePolicy>, CoreError> {
        self.engine
            .policies()
            .into_iter()
            .map(CachePolicy::new)
            .collect()
    }

    /// Persisted policies plus the default policy at the end, unless one
    /// with the default pattern is persisted explicitly
    pub fn effective_list(&self) -> Result<Vec<CachePolicy>, CoreError> {
        let mut policies = self.list()?;
        if !policies.iter().any(CachePolicy::is_default) {
            policies.push(CachePolicy::default_policy());
        }
        Ok(policies)
    }

    /// Append a policy to the end of the order
    pub fn add(&mut self, record: PolicyRecord) -> Result<(), CoreError> {
        if self.contains(&record.pattern) {
            return Err(CoreError::DuplicatePolicy(record.pattern));
        }
        // Reject patterns that would make the store unreadable
        CachePolicy::new(record.clone())?;

        let pattern = record.pattern.clone();
        self.engine.add_policy(record)?;
        info!("Added cache policy {}", pattern);
        Ok(())
    }

    pub fn remove(&mut self, pattern: &str) -> Result<PolicyRecord, CoreError> {
        let removed = self
            .engine
            .remove_policy(pattern)?
            .ok_or_else(|| CoreError::PolicyNotFound {
                action: "remove",
                pattern: pattern.to_string(),
            })?;
        info!("Removed cache policy {}", pattern);
        Ok(removed)
    }
}
