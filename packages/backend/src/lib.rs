//! Storage primitives for the devconf configuration store.
//!
//! The store above this layer only ever speaks [`StorageBackend`]:
//! open-for-read, open-for-write, remove, rename, and copy of named
//! files. Two implementations ship here:
//!
//! - [`FsBackend`]: files inside a rooted directory on a real filesystem
//! - [`MemoryBackend`]: a shared-state map of name to bytes, used by
//!   tests and host-side simulation
//!
//! # Example
//!
//! ```rust
//! use devconf_backend::{MemoryBackend, StorageBackend};
//! use std::io::Read;
//!
//! let mut backend = MemoryBackend::new();
//! backend.insert("config.json", b"{}");
//!
//! let mut contents = String::new();
//! backend
//!     .open_read("config.json")
//!     .unwrap()
//!     .read_to_string(&mut contents)
//!     .unwrap();
//! assert_eq!(contents, "{}");
//! ```

use std::io;

mod error;
mod fs;
mod memory;

pub use error::BackendError;
pub use fs::FsBackend;
pub use memory::MemoryBackend;

/// File-level storage primitives required by the configuration store.
///
/// Implementations are driven from a single task; no `Send`/`Sync`
/// bounds are required. Handle lifecycle is plain Rust ownership:
/// dropping a handle closes it, and writers must be flushed before drop
/// when durability matters.
pub trait StorageBackend {
    /// Whether the backing medium is ready for use.
    fn initialized(&self) -> bool;

    /// Open the named file for reading.
    fn open_read(&mut self, name: &str) -> Result<Box<dyn io::Read>, BackendError>;

    /// Open the named file for writing, truncating any existing content.
    fn open_write(&mut self, name: &str) -> Result<Box<dyn io::Write>, BackendError>;

    /// Remove the named file.
    fn remove(&mut self, name: &str) -> Result<(), BackendError>;

    /// Rename `from` onto `to`.
    ///
    /// Implementations are not required to replace an existing
    /// destination. Callers that need replace semantics must remove the
    /// destination themselves and retry.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), BackendError>;

    /// Copy `from` to `to`, replacing any existing destination.
    fn copy(&mut self, from: &str, to: &str) -> Result<(), BackendError>;
}
