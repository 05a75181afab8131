//! Cache policies
//!
//! A policy pairs a URI pattern with limits. Policies are kept in a
//! caller-visible order; the first caching policy whose pattern matches
//! a URI owns that URI.

mod mutator;
mod store;

pub use mutator::{PolicyMutator, PolicyRequest};
pub use store::PolicyStore;

use cachectl_storage::defaults::DEFAULT_PATTERN;
use cachectl_storage::PolicyRecord;
use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::error::CoreError;

/// Compile a case-insensitive, unanchored URI pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, CoreError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// A policy record with its compiled matcher
#[derive(Debug, Clone)]
pub struct CachePolicy {
    record: PolicyRecord,
    matcher: Regex,
}

impl CachePolicy {
    pub fn new(record: PolicyRecord) -> Result<Self, CoreError> {
        let matcher = compile_pattern(&record.pattern)?;
        Ok(Self { record, matcher })
    }

    /// The implicit catch-all policy used when none is persisted
    ///
    /// Built on demand and never handed to the engine.
    pub fn default_policy() -> Self {
        Self {
            record: PolicyRecord::new(DEFAULT_PATTERN, true),
            matcher: Regex::new(DEFAULT_PATTERN).expect("default pattern is a valid regex"),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.record.pattern
    }

    pub fn is_default(&self) -> bool {
        self.record.pattern == DEFAULT_PATTERN
    }

    /// Whether matching resources are cached
    pub fn caches(&self) -> bool {
        self.record.include
    }

    pub fn max_entries(&self) -> Option<u64> {
        bounded(self.record.max_entries)
    }

    pub fn max_space(&self) -> Option<u64> {
        bounded(self.record.max_space)
    }

    pub fn max_age(&self) -> Option<u64> {
        bounded(self.record.max_age)
    }

    pub fn delete_wait(&self) -> i64 {
        self.record.delete_wait
    }

    pub fn record(&self) -> &PolicyRecord {
        &self.record
    }

    /// Search for the pattern anywhere in `uri`
    pub fn matches(&self, uri: &str) -> bool {
        self.matcher.is_match(uri)
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.caches() {
            write!(f, "Cache {}", self.pattern())
        } else {
            write!(f, "Exclude {}", self.pattern())
        }
    }
}

fn bounded(limit: i64) -> Option<u64> {
    u64::try_from(limit).ok()
}
