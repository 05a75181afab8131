//! Cache inspection and administration

mod classify;
mod flush;
mod manager;

pub use classify::{Classification, EntryClassifier, PolicyStatistics};
pub use flush::{DeletionFailure, FlushExecutor, FlushReport, FlushStage, FlushState};
pub use manager::CacheManager;
