//! Error types for the configuration store.

use devconf_backend::BackendError;

use crate::path::PathError;

/// Errors raised while loading, navigating, or persisting the document.
///
/// None of these cross the device-facing surface directly: the public
/// methods of [`ConfigStore`](crate::ConfigStore) reduce them to
/// booleans or caller-supplied defaults and log the detail.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Path(#[from] PathError),

    /// The storage backend is not ready.
    #[error("storage backend is not initialized")]
    NotInitialized,

    /// No configuration file has been configured yet.
    #[error("no configuration file is configured")]
    NoFile,

    /// No document has been loaded; the write surface is unavailable.
    #[error("no configuration document is loaded")]
    NotLoaded,

    /// A write path traverses or lands on a node whose existing type is
    /// incompatible with what the write requires.
    #[error("type conflict at '{path}': {message}")]
    TypeConflict { path: String, message: String },

    /// A storage primitive failed.
    #[error("storage failure: {0}")]
    Io(#[from] BackendError),

    /// Parsing or encoding the document failed.
    #[error("serialization failed: {message}")]
    Serialization { message: String },
}
