//! Cache manager implementation

use cachectl_storage::{CacheEngine, PolicyRecord};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::classify::{Classification, EntryClassifier};
use super::flush::{FlushExecutor, FlushReport};
use crate::error::CoreError;
use crate::policy::{PolicyMutator, PolicyStore, compile_pattern};
use crate::report::{Reporter, ShowSummary};

/// Command facade over a cache engine
///
/// Every call reads policies and entries fresh from the engine. Policy
/// mutations finish with an inspect report of the new state.
pub struct CacheManager<E> {
    store: PolicyStore<E>,
    directory: PathBuf,
}

impl<E: CacheEngine> CacheManager<E> {
    /// Create a new cache manager
    pub fn new(engine: E) -> Result<Self, CoreError> {
        let directory = engine
            .directory()
            .map(Path::to_path_buf)
            .ok_or(CoreError::StorageInit(None))?;

        debug!("Initializing cache manager for {:?}", directory);

        Ok(Self {
            store: PolicyStore::new(engine),
            directory,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn store(&self) -> &PolicyStore<E> {
        &self.store
    }

    /// List entries, optionally filtered by a regex over their display key
    pub fn show<O: Write, W: Write>(
        &self,
        filter: Option<&str>,
        verbose: bool,
        reporter: &mut Reporter<O, W>,
    ) -> Result<ShowSummary, CoreError> {
        let filter = filter.map(compile_pattern).transpose()?;
        reporter.cache_directory(&self.directory)?;

        let entries = self.store.engine().entries()?;
        Ok(reporter.show(&entries, filter.as_ref(), verbose)?)
    }

    /// Classify all entries and report per-policy statistics and limits
    pub fn inspect<O: Write, W: Write>(
        &self,
        reporter: &mut Reporter<O, W>,
    ) -> Result<Classification, CoreError> {
        reporter.cache_directory(&self.directory)?;

        let policies = self.store.effective_list()?;
        let entries = self.store.engine().entries()?;
        let classification = EntryClassifier::new(&policies).classify(&entries)?;

        reporter.inspect(&policies, &classification)?;
        Ok(classification)
    }

    pub fn create<O: Write, W: Write>(
        &mut self,
        record: PolicyRecord,
        reporter: &mut Reporter<O, W>,
    ) -> Result<Classification, CoreError> {
        reporter.cache_directory(&self.directory)?;
        PolicyMutator::new(&mut self.store).create(record)?;
        self.inspect(reporter)
    }

    /// Replace a policy; the policy moves to the end of the order
    pub fn update<O: Write, W: Write>(
        &mut self,
        record: PolicyRecord,
        reporter: &mut Reporter<O, W>,
    ) -> Result<Classification, CoreError> {
        reporter.cache_directory(&self.directory)?;
        PolicyMutator::new(&mut self.store).update(record)?;
        self.inspect(reporter)
    }

    pub fn delete<O: Write, W: Write>(
        &mut self,
        pattern: &str,
        reporter: &mut Reporter<O, W>,
    ) -> Result<Classification, CoreError> {
        reporter.cache_directory(&self.directory)?;
        PolicyMutator::new(&mut self.store).delete(pattern)?;
        self.inspect(reporter)
    }

    /// Delete every entry whose display key matches `filter`
    ///
    /// Deletion failures are reported per entry and do not fail the call.
    pub fn flush<O: Write, W: Write>(
        &self,
        filter: &str,
        reporter: &mut Reporter<O, W>,
    ) -> Result<FlushReport, CoreError> {
        let executor = FlushExecutor::new(filter)?;
        reporter.cache_directory(&self.directory)?;

        info!("Flushing entries matching '{}'", filter);
        let entries = self.store.engine().entries()?;
        let report = executor.run(&entries);

        reporter.flush(&report)?;
        Ok(report)
    }
}
