//! Debounced persistence: the outdated state machine and the atomic
//! write-to-storage sequence.

use std::io::Write as _;

use devconf_backend::{BackendError, StorageBackend};
use serde_json::Value;

use crate::error::Error;

/// When a write must reach durable storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveUrgency {
    /// Coalesce with nearby writes; flushed by the periodic tick.
    #[default]
    Deferred,
    /// Flush synchronously before the write returns.
    Critical,
}

/// Suffix of the temporary sibling used during an atomic save.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

pub(crate) const DEFAULT_MIN_INTERVAL_MS: u64 = 500;
pub(crate) const DEFAULT_MAX_LATENCY_MS: u64 = 5000;

/// Tracks whether the in-memory document has diverged from the last
/// successfully saved file, and for how long.
///
/// `first_outdated_ms` is stamped only on the clean-to-outdated
/// transition; `last_outdated_ms` on every mutation. Both are
/// meaningless while clean.
#[derive(Debug)]
pub(crate) struct DebounceState {
    outdated: bool,
    first_outdated_ms: u64,
    last_outdated_ms: u64,
    min_interval_ms: u64,
    max_latency_ms: u64,
}

impl Default for DebounceState {
    fn default() -> DebounceState {
        DebounceState {
            outdated: false,
            first_outdated_ms: 0,
            last_outdated_ms: 0,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            max_latency_ms: DEFAULT_MAX_LATENCY_MS,
        }
    }
}

impl DebounceState {
    /// Record a mutation at `now_ms`.
    pub(crate) fn mark(&mut self, now_ms: u64) {
        if !self.outdated {
            self.first_outdated_ms = now_ms;
        }
        self.outdated = true;
        self.last_outdated_ms = now_ms;
    }

    /// Record a successful save. Timestamps stay put so a failed save
    /// keeps its pending age for the max-latency bound.
    pub(crate) fn clear(&mut self) {
        self.outdated = false;
    }

    pub(crate) fn is_outdated(&self) -> bool {
        self.outdated
    }

    pub(crate) fn set_min_interval(&mut self, ms: u64) {
        self.min_interval_ms = ms;
    }

    pub(crate) fn set_max_latency(&mut self, ms: u64) {
        self.max_latency_ms = ms;
    }

    /// Whether a deferred flush is due at `now_ms`: writes have settled
    /// for the minimum interval, or the oldest pending change has
    /// reached the maximum latency. Always false while clean.
    pub(crate) fn due(&self, now_ms: u64) -> bool {
        if !self.outdated {
            return false;
        }
        let settled = now_ms.saturating_sub(self.last_outdated_ms) >= self.min_interval_ms;
        let starved = now_ms.saturating_sub(self.first_outdated_ms) >= self.max_latency_ms;
        settled || starved
    }
}

/// Serialize `tree` and atomically replace the live file.
///
/// The whole document is written to `<live>.tmp`, flushed, and renamed
/// onto `live`. Backends whose rename cannot replace an existing
/// destination get one remove-and-retry; if the retry also fails, the
/// temp file is removed and the previously committed live file is left
/// as it was. The remove-before-retry is the one window in which a
/// power loss can leave neither file in place.
pub(crate) fn write_atomic<B: StorageBackend>(
    backend: &mut B,
    live: &str,
    tree: &Value,
) -> Result<(), Error> {
    if !backend.initialized() {
        return Err(Error::NotInitialized);
    }

    let tmp = format!("{live}{TMP_SUFFIX}");
    let mut out = backend.open_write(&tmp)?;

    let bytes = serde_json::to_vec(tree).map_err(|error| Error::Serialization {
        message: error.to_string(),
    })?;
    if bytes.is_empty() {
        drop(out);
        let _ = backend.remove(&tmp);
        return Err(Error::Serialization {
            message: "serializer produced no output".to_string(),
        });
    }

    let written = out.write_all(&bytes).and_then(|()| out.flush());
    drop(out);
    if let Err(source) = written {
        let _ = backend.remove(&tmp);
        return Err(Error::Io(BackendError::Write { name: tmp, source }));
    }

    if backend.rename(&tmp, live).is_err() {
        // Non-replacing rename: clear the destination and retry once.
        let _ = backend.remove(live);
        if let Err(error) = backend.rename(&tmp, live) {
            let _ = backend.remove(&tmp);
            return Err(Error::Io(error));
        }
    }

    log::debug!("saved configuration to {}", live);
    Ok(())
}

#[cfg(test)]
mod debounce_tests {
    use super::*;

    #[test]
    fn clean_state_is_never_due() {
        let state = DebounceState::default();
        assert!(!state.is_outdated());
        assert!(!state.due(0));
        assert!(!state.due(u64::MAX));
    }

    #[test]
    fn first_mark_stamps_both_timestamps() {
        let mut state = DebounceState::default();
        state.mark(1_000);
        assert!(state.is_outdated());
        assert!(!state.due(1_000));
        // Due once the min interval has elapsed with no further marks.
        assert!(state.due(1_500));
    }

    #[test]
    fn repeated_marks_keep_first_stamp() {
        let mut state = DebounceState::default();
        state.mark(1_000);
        state.mark(1_400);
        state.mark(1_800);
        // Idle since the last mark is only 300ms.
        assert!(!state.due(2_100));
        // But the pending age hits max latency at 6_000.
        assert!(state.due(6_000));
    }

    #[test]
    fn settling_makes_it_due() {
        let mut state = DebounceState::default();
        state.mark(1_000);
        state.mark(1_200);
        assert!(!state.due(1_400));
        assert!(state.due(1_700));
    }

    #[test]
    fn clear_returns_to_clean() {
        let mut state = DebounceState::default();
        state.mark(1_000);
        state.clear();
        assert!(!state.is_outdated());
        assert!(!state.due(10_000));
        // The next mark restamps the first timestamp.
        state.mark(20_000);
        assert!(!state.due(20_400));
        assert!(state.due(20_500));
    }

    #[test]
    fn thresholds_are_tunable() {
        let mut state = DebounceState::default();
        state.set_min_interval(100);
        state.set_max_latency(250);
        state.mark(1_000);
        assert!(state.due(1_100));

        let mut state = DebounceState::default();
        state.set_min_interval(100);
        state.set_max_latency(250);
        state.mark(1_000);
        state.mark(1_090);
        state.mark(1_180);
        assert!(state.due(1_250));
    }
}

#[cfg(test)]
mod write_atomic_tests {
    use super::*;
    use devconf_backend::MemoryBackend;
    use serde_json::json;

    #[test]
    fn writes_through_temp_and_rename() {
        let mut backend = MemoryBackend::new();
        write_atomic(&mut backend, "config.json", &json!({"a": 1})).unwrap();

        assert_eq!(backend.contents("config.json").unwrap(), b"{\"a\":1}");
        assert!(!backend.exists("config.json.tmp"));
    }

    #[test]
    fn replaces_existing_live_file() {
        // MemoryBackend's rename is non-replacing, so this exercises
        // the remove-and-retry path.
        let mut backend = MemoryBackend::new();
        backend.insert("config.json", b"old");

        write_atomic(&mut backend, "config.json", &json!({"a": 2})).unwrap();
        assert_eq!(backend.contents("config.json").unwrap(), b"{\"a\":2}");
        assert!(!backend.exists("config.json.tmp"));
    }

    #[test]
    fn open_failure_leaves_live_untouched() {
        let mut backend = MemoryBackend::new();
        backend.insert("config.json", b"old");
        backend.fail_open_write(true);

        assert!(write_atomic(&mut backend, "config.json", &json!({"a": 3})).is_err());
        assert_eq!(backend.contents("config.json").unwrap(), b"old");
    }

    #[test]
    fn rename_failure_cleans_up_temp() {
        let mut backend = MemoryBackend::new();
        backend.fail_rename(true);

        assert!(write_atomic(&mut backend, "config.json", &json!({"a": 4})).is_err());
        assert!(!backend.exists("config.json.tmp"));
        assert!(!backend.exists("config.json"));
    }

    #[test]
    fn uninitialized_backend_does_no_io() {
        let backend = MemoryBackend::new();
        backend.deinitialize();
        let mut handle = backend.clone();

        assert!(matches!(
            write_atomic(&mut handle, "config.json", &json!({})),
            Err(Error::NotInitialized)
        ));
        assert_eq!(backend.file_count(), 0);
    }
}
