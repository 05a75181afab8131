//! cachectl Core Logic
//!
//! This crate provides the policy model of a local resource cache:
//! ordered URI-pattern policies, first-match classification of cached
//! entries, the create/update/delete protocol, flushing, and reporting.

pub mod cache;
pub mod error;
pub mod policy;
pub mod report;
pub mod units;

pub use cache::{
    CacheManager, Classification, DeletionFailure, EntryClassifier, FlushExecutor, FlushReport,
    PolicyStatistics,
};
pub use error::CoreError;
pub use policy::{CachePolicy, PolicyMutator, PolicyRequest, PolicyStore};
pub use report::{Reporter, ShowSummary};
