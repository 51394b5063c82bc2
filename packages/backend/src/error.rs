//! Error types for storage backends.

use std::io;
use std::path::PathBuf;

/// Errors raised by [`StorageBackend`](crate::StorageBackend)
/// implementations.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    /// The backend's root location is unusable.
    #[error("invalid storage root {path:?}: {message}")]
    InvalidRoot {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Opening a file for reading or writing failed.
    #[error("failed to open '{name}': {source}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Writing through an open handle failed.
    #[error("failed to write '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Removing a file failed.
    #[error("failed to remove '{name}': {source}")]
    Remove {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Renaming a file failed. This includes the non-replacing case
    /// where the destination already exists.
    #[error("failed to rename '{from}' to '{to}': {message}")]
    Rename {
        from: String,
        to: String,
        message: String,
    },

    /// Copying a file failed.
    #[error("failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },
}
