//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a cache directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to parse policy file {}: {source}", .path.display())]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize policies: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to persist policy file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
