//! Storage error types

use std::path::PathBuf;

/// Errors raised by [`super::ImageStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage root could not be created
    #[error("Failed to create storage root '{}': {source}", path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read or write against the storage medium failed
    #[error("Storage I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary upload file could not be moved into place
    #[error("Failed to commit '{}': {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
