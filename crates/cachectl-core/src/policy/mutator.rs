//! Create, update and delete protocol over the policy store

use cachectl_storage::{CacheEngine, PolicyRecord, defaults};
use tracing::debug;

use super::PolicyStore;
use crate::error::CoreError;
use crate::units::{parse_duration, parse_size};

/// Unparsed policy settings as given on the command line
#[derive(Debug, Clone)]
pub struct PolicyRequest {
    pub pattern: String,
    pub include: bool,
    pub size: Option<String>,
    pub space: Option<String>,
    pub age: Option<String>,
    pub delete_wait: Option<String>,
}

impl PolicyRequest {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            include: true,
            size: None,
            space: None,
            age: None,
            delete_wait: None,
        }
    }

    /// Parse the limits, using the system defaults for absent values
    pub fn resolve(&self) -> Result<PolicyRecord, CoreError> {
        let invalid = |field| move |source| CoreError::InvalidValue { field, source };

        Ok(PolicyRecord {
            pattern: self.pattern.clone(),
            include: self.include,
            max_entries: parse_size(self.size.as_deref(), defaults::CACHE_SIZE)
                .map_err(invalid("size"))?,
            max_space: parse_size(self.space.as_deref(), defaults::CACHE_SPACE)
                .map_err(invalid("space"))?,
            max_age: parse_duration(self.age.as_deref(), defaults::MAX_AGE)
                .map_err(invalid("age"))?,
            delete_wait: parse_duration(self.delete_wait.as_deref(), defaults::DELETE_WAIT)
                .map_err(invalid("delete wait"))?,
        })
    }
}

/// Existence-checked mutations of a policy store
pub struct PolicyMutator<'a, E> {
    store: &'a mut PolicyStore<E>,
}

impl<'a, E: CacheEngine> PolicyMutator<'a, E> {
    pub fn new(store: &'a mut PolicyStore<E>) -> Self {
        Self { store }
    }

    /// Add a policy that must not exist yet
    pub fn create(&mut self, record: PolicyRecord) -> Result<(), CoreError> {
        if self.store.contains(&record.pattern) {
            return Err(CoreError::DuplicatePolicy(record.pattern));
        }
        self.store.add(record)
    }

    /// Replace an existing policy
    ///
    /// Implemented as remove then add, so the policy moves to the end of
    /// the order and therefore after any policy that used to follow it.
    pub fn update(&mut self, record: PolicyRecord) -> Result<(), CoreError> {
        if !self.store.contains(&record.pattern) {
            return Err(CoreError::PolicyNotFound {
                action: "update",
                pattern: record.pattern,
            });
        }
        debug!("Updating cache policy {}", record.pattern);
        self.store.remove(&record.pattern)?;
        self.store.add(record)
    }

    pub fn delete(&mut self, pattern: &str) -> Result<(), CoreError> {
        if !self.store.contains(pattern) {
            return Err(CoreError::PolicyNotFound {
                action: "delete",
                pattern: pattern.to_string(),
            });
        }
        self.store.remove(pattern)?;
        Ok(())
    }
}
