//! Core error types

use std::path::PathBuf;
use thiserror::Error;

use crate::units::UnitError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] cachectl_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot create '{0}', it already exists")]
    DuplicatePolicy(String),

    #[error("Cannot {action} '{pattern}', it doesn't exist")]
    PolicyNotFound {
        action: &'static str,
        pattern: String,
    },

    #[error("Cache is invalid: no caching policy matches {0}")]
    InvalidCacheState(String),

    #[error("Failed to initialize cache{}", directory_suffix(.0))]
    StorageInit(Option<PathBuf>),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid {field}: {source}")]
    InvalidValue {
        field: &'static str,
        #[source]
        source: UnitError,
    },
}

fn directory_suffix(directory: &Option<PathBuf>) -> String {
    directory
        .as_ref()
        .map(|d| format!(": {}", d.display()))
        .unwrap_or_default()
}

impl CoreError {
    /// Errors caused by what the user asked for, as opposed to cache faults
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicatePolicy(_)
                | CoreError::PolicyNotFound { .. }
                | CoreError::StorageInit(_)
                | CoreError::InvalidPattern { .. }
                | CoreError::InvalidValue { .. }
        )
    }
}
