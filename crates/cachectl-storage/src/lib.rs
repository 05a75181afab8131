//! cachectl Storage Layer
//!
//! This crate provides the cache engine boundary for cachectl: the
//! persisted policy records, the read-only view of cached entries, and
//! engines backed by a local cache directory or by memory.

pub mod backend;
pub mod defaults;
pub mod error;
pub mod local;
pub mod memory;
pub mod models;

pub use backend::CacheEngine;
pub use error::StorageError;
pub use local::LocalCache;
pub use memory::MemoryCache;
pub use models::{CacheEntry, EntryKind, PolicyRecord, RARR};
