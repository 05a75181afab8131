//! Entry classification
//!
//! Every entry belongs to exactly one caching policy: the first one, in
//! effective-list order, whose pattern matches the entry URI. This is a
//! linear first-match scan on purpose; a more specific policy declared
//! later never wins over an earlier one.

use cachectl_storage::CacheEntry;
use std::collections::HashMap;
use tracing::debug;

use crate::error::CoreError;
use crate::policy::CachePolicy;

/// Entries and bytes attributed to one policy during a classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyStatistics {
    pub count: u64,
    pub space: u64,
}

/// Per-policy statistics keyed by pattern
///
/// Every caching policy has an entry, even when nothing matched it.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    stats: HashMap<String, PolicyStatistics>,
}

impl Classification {
    pub fn get(&self, pattern: &str) -> Option<&PolicyStatistics> {
        self.stats.get(pattern)
    }
}

pub struct EntryClassifier<'a> {
    caching: Vec<&'a CachePolicy>,
}

impl<'a> EntryClassifier<'a> {
    /// Build a classifier over the caching policies of `policies`, in order
    pub fn new(policies: &'a [CachePolicy]) -> Self {
        Self {
            caching: policies.iter().filter(|p| p.caches()).collect(),
        }
    }

    /// The policy that owns `uri`
    pub fn owner(&self, uri: &str) -> Option<&'a CachePolicy> {
        self.caching.iter().copied().find(|p| p.matches(uri))
    }

    pub fn classify(&self, entries: &[CacheEntry]) -> Result<Classification, CoreError> {
        let mut stats: HashMap<String, PolicyStatistics> = self
            .caching
            .iter()
            .map(|p| (p.pattern().to_string(), PolicyStatistics::default()))
            .collect();

        for entry in entries {
            let policy = self
                .owner(&entry.uri)
                .ok_or_else(|| CoreError::InvalidCacheState(entry.uri.clone()))?;
            debug!("{} -> {}", entry.uri, policy.pattern());

            let stat = stats.entry(policy.pattern().to_string()).or_default();
            stat.count += 1;
            stat.space += entry.len();
        }

        Ok(Classification { stats })
    }
}
