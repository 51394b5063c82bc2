//! The typed configuration store: the device-facing read/write surface
//! over the document tree, wired to debounced persistence.

use devconf_backend::StorageBackend;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::path::Path;
use crate::persist::{self, DebounceState, SaveUrgency};
use crate::tree;
use crate::value::{FromValue, Scalar};

/// Prefix marking the factory-default sibling of a configuration file.
pub const DEFAULT_SETTINGS_PREFIX: &str = "def-";

/// A persistent, path-addressed configuration document.
///
/// The store owns a single JSON document whose root is an object.
/// Values are read and written by `|`-delimited paths. Every mutation
/// marks the document outdated; [`control`](ConfigStore::control)
/// flushes outdated state once writes settle for the minimum interval,
/// or once the oldest pending change reaches the maximum latency.
/// Critical writes flush synchronously before returning.
///
/// Reads never fail: an absent path or a type mismatch degrades to the
/// caller's default. Writes report failure when the destination cannot
/// be materialized without destroying existing structure.
///
/// All operations run on one task; I/O is synchronous and nothing here
/// is shared across threads.
pub struct ConfigStore<B: StorageBackend> {
    backend: B,
    clock: Box<dyn Clock>,
    file: Option<String>,
    root: Value,
    debounce: DebounceState,
}

impl<B: StorageBackend> ConfigStore<B> {
    /// Create a store over `backend` with the system clock.
    pub fn new(backend: B) -> ConfigStore<B> {
        ConfigStore::with_clock(backend, Box::new(SystemClock))
    }

    /// Create a store with an explicit time source.
    pub fn with_clock(backend: B, clock: Box<dyn Clock>) -> ConfigStore<B> {
        ConfigStore {
            backend,
            clock,
            file: None,
            root: Value::Null,
            debounce: DebounceState::default(),
        }
    }

    // ==================== loading ====================

    /// Load the document from `name`.
    ///
    /// The filename is remembered even when the load fails, so
    /// [`reset_to_default_settings`](ConfigStore::reset_to_default_settings)
    /// can restore a missing or corrupt file and the load can be
    /// retried. A failed open or parse leaves the in-memory document
    /// exactly as it was before the call.
    pub fn load_configuration_file(&mut self, name: &str) -> bool {
        match self.try_load(name) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("failed to load configuration '{}': {}", name, error);
                false
            }
        }
    }

    fn try_load(&mut self, name: &str) -> Result<(), Error> {
        if !self.backend.initialized() {
            return Err(Error::NotInitialized);
        }
        self.file = Some(name.to_string());

        let reader = self.backend.open_read(name)?;
        let parsed: Value = serde_json::from_reader(reader).map_err(|error| {
            Error::Serialization {
                message: error.to_string(),
            }
        })?;
        if !parsed.is_object() {
            return Err(Error::Serialization {
                message: "configuration root is not an object".to_string(),
            });
        }

        self.root = parsed;
        // The document now matches what is on disk.
        self.debounce.clear();
        Ok(())
    }

    // ==================== reads ====================

    /// Typed read with a default.
    ///
    /// Returns `default` when the path is invalid, absent, or holds a
    /// value of a different runtime type. Never mutates the tree.
    pub fn get<T: FromValue>(&self, path: &str, default: T) -> T {
        let Ok(path) = Path::parse(path) else {
            return default;
        };
        match tree::get_path(&self.root, &path) {
            Some(node) => T::from_value(node).unwrap_or(default),
            None => default,
        }
    }

    /// String read with a `&str` default.
    pub fn get_str(&self, path: &str, default: &str) -> String {
        self.get(path, default.to_string())
    }

    /// Typed read of `sub_path` inside element `index` of the array at
    /// `array_path`. An empty `sub_path` addresses the element itself.
    /// Same default-on-mismatch contract as [`get`](ConfigStore::get).
    pub fn get_at<T: FromValue>(
        &self,
        array_path: &str,
        index: usize,
        sub_path: &str,
        default: T,
    ) -> T {
        let (Ok(array_path), Ok(sub_path)) = (Path::parse(array_path), Path::parse(sub_path))
        else {
            return default;
        };
        let Some(Value::Array(arr)) = tree::get_path(&self.root, &array_path) else {
            return default;
        };
        let Some(element) = arr.get(index) else {
            return default;
        };
        match tree::get_path(element, &sub_path) {
            Some(node) => T::from_value(node).unwrap_or(default),
            None => default,
        }
    }

    /// Element or key count at `path`; 0 for scalars, absent nodes, and
    /// invalid paths.
    pub fn elements(&self, path: &str) -> usize {
        match Path::parse(path) {
            Ok(path) => tree::element_count(&self.root, &path),
            Err(_) => 0,
        }
    }

    // ==================== writes ====================

    /// Write `value` at `path`, creating missing intermediate objects.
    ///
    /// Fails when the path is empty or invalid, when an intermediate
    /// node has an incompatible type, or when no document is loaded.
    /// Deferred urgency marks the document outdated for the periodic
    /// tick to flush; critical urgency saves before returning, and the
    /// save result is the return value.
    pub fn set(
        &mut self,
        path: &str,
        value: impl Into<Scalar>,
        urgency: SaveUrgency,
    ) -> bool {
        match self.try_set(path, value.into()) {
            Ok(()) => self.commit(urgency),
            Err(error) => {
                log::warn!("failed to set '{}': {}", path, error);
                false
            }
        }
    }

    fn try_set(&mut self, path: &str, value: Scalar) -> Result<(), Error> {
        if !self.root.is_object() {
            return Err(Error::NotLoaded);
        }
        let path = Path::parse(path)?;
        if path.is_empty() {
            return Err(Error::TypeConflict {
                path: String::new(),
                message: "the document root cannot be replaced by a scalar".to_string(),
            });
        }
        let node = tree::ensure_path_mut(&mut self.root, &path)?;
        *node = Value::from(value);
        Ok(())
    }

    /// Write `value` at `sub_path` inside element `index` of the array
    /// at `array_path`, growing the array with empty-object
    /// placeholders through `index`. An empty `sub_path` overwrites the
    /// element itself.
    pub fn set_at(
        &mut self,
        array_path: &str,
        index: usize,
        sub_path: &str,
        value: impl Into<Scalar>,
        urgency: SaveUrgency,
    ) -> bool {
        match self.try_set_at(array_path, index, sub_path, value.into()) {
            Ok(()) => self.commit(urgency),
            Err(error) => {
                log::warn!("failed to set '{}'[{}]: {}", array_path, index, error);
                false
            }
        }
    }

    fn try_set_at(
        &mut self,
        array_path: &str,
        index: usize,
        sub_path: &str,
        value: Scalar,
    ) -> Result<(), Error> {
        if !self.root.is_object() {
            return Err(Error::NotLoaded);
        }
        let array_path = Path::parse(array_path)?;
        let sub_path = Path::parse(sub_path)?;
        let element = tree::ensure_array_slot(&mut self.root, &array_path, index)?;
        let node = tree::ensure_path_mut(element, &sub_path)?;
        *node = Value::from(value);
        Ok(())
    }

    /// Apply the urgency policy after a successful in-place mutation.
    fn commit(&mut self, urgency: SaveUrgency) -> bool {
        self.debounce.mark(self.clock.now_millis());
        match urgency {
            SaveUrgency::Deferred => true,
            SaveUrgency::Critical => self.save_settings(),
        }
    }

    // ==================== persistence ====================

    /// Force an immediate atomic save, regardless of outdated state.
    pub fn save_settings(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => {
                self.debounce.clear();
                true
            }
            Err(error) => {
                log::warn!("failed to save configuration: {}", error);
                false
            }
        }
    }

    fn try_save(&mut self) -> Result<(), Error> {
        let file = self.file.as_deref().ok_or(Error::NoFile)?;
        persist::write_atomic(&mut self.backend, file, &self.root)
    }

    /// Periodic tick. Flushes the document once deferred writes settle
    /// for the minimum interval, or once pending changes reach the
    /// maximum latency. A failed save stays outdated and is retried on
    /// a later tick. Two comparisons and no I/O when clean.
    pub fn control(&mut self) {
        if self.debounce.due(self.clock.now_millis()) {
            self.save_settings();
        }
    }

    /// Restore the factory-default file over the live configuration.
    ///
    /// Copies the `def-`-prefixed sibling of the configured filename
    /// onto it. The in-memory document is not touched; the caller
    /// reloads afterwards.
    pub fn reset_to_default_settings(&mut self) -> bool {
        match self.try_reset() {
            Ok(()) => true,
            Err(error) => {
                log::warn!("failed to reset to default settings: {}", error);
                false
            }
        }
    }

    fn try_reset(&mut self) -> Result<(), Error> {
        let file = self.file.clone().ok_or(Error::NoFile)?;
        let defaults = default_settings_name(&file);
        self.backend.copy(&defaults, &file)?;
        Ok(())
    }

    // ==================== debounce tuning ====================

    /// Idle time after the last deferred write before a flush.
    pub fn set_min_interval(&mut self, ms: u64) {
        self.debounce.set_min_interval(ms);
    }

    /// Upper bound on how long any deferred write may stay pending.
    pub fn set_max_latency(&mut self, ms: u64) {
        self.debounce.set_max_latency(ms);
    }

    // ==================== accessors ====================

    /// Whether in-memory content has diverged from the last saved file.
    pub fn outdated(&self) -> bool {
        self.debounce.is_outdated()
    }

    /// The configured filename, set by the first load attempt.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

/// `def-`-prefixed sibling name for a configuration file.
fn default_settings_name(file: &str) -> String {
    match file.rfind('/') {
        Some(pos) => format!(
            "{}{}{}",
            &file[..pos + 1],
            DEFAULT_SETTINGS_PREFIX,
            &file[pos + 1..]
        ),
        None => format!("{DEFAULT_SETTINGS_PREFIX}{file}"),
    }
}
