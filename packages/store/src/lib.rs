//! devconf: a persistent, path-addressed configuration document for
//! small devices.
//!
//! The store owns a single JSON document in memory, reads and writes
//! values by `|`-delimited path strings, and persists the document
//! under two policies: critical writes hit storage before returning,
//! while deferred writes coalesce into one atomic disk write once the
//! device loop settles.
//!
//! - [`Path`]: parsed, whitespace-trimmed path segments
//! - [`tree`]: navigation and ensure-and-create traversal of the tree
//! - [`ConfigStore`]: the typed read/write surface
//! - [`SaveUrgency`]: deferred vs. critical persistence
//!
//! # Example
//!
//! ```rust
//! use devconf_backend::MemoryBackend;
//! use devconf_store::{ConfigStore, SaveUrgency};
//!
//! let backend = MemoryBackend::new();
//! backend.insert("config.json", br#"{"wifi":{"ssid":"lab"}}"#);
//!
//! let mut store = ConfigStore::new(backend);
//! assert!(store.load_configuration_file("config.json"));
//!
//! assert_eq!(store.get_str("wifi|ssid", ""), "lab");
//! assert!(store.set("wifi|channel", 6, SaveUrgency::Deferred));
//! assert_eq!(store.get("wifi|channel", 0), 6);
//!
//! // Periodic tick; flushes once deferred writes settle.
//! store.control();
//! ```

mod clock;
mod error;
mod path;
mod persist;
mod store;
pub mod tree;
mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use path::{Path, PathError, DELIMITER};
pub use persist::SaveUrgency;
pub use store::{ConfigStore, DEFAULT_SETTINGS_PREFIX};
pub use value::{FromValue, Scalar};

// Re-export the backend contract so applications depend on one crate.
pub use devconf_backend::{BackendError, FsBackend, MemoryBackend, StorageBackend};
