//! In-memory storage backend with shared, inspectable state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

use crate::{BackendError, StorageBackend};

/// A [`StorageBackend`] holding files in a map of name to bytes.
///
/// Cloning the backend clones a handle to the same underlying state, so
/// a test can keep one handle for inspection while the store owns the
/// other.
///
/// `rename` is non-replacing, matching LittleFS-class embedded
/// filesystems: renaming onto an existing name fails, which forces
/// callers through their remove-and-retry path. Fault injection
/// toggles let tests fail `open_write` or `rename` on demand.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    write_count: u64,
    deinitialized: bool,
    fail_open_write: bool,
    fail_rename: bool,
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }

    /// Seed a file directly, bypassing the write path.
    pub fn insert(&self, name: &str, bytes: &[u8]) {
        self.inner
            .borrow_mut()
            .files
            .insert(name.to_string(), bytes.to_vec());
    }

    /// Raw contents of a file, if present.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.inner.borrow().files.contains_key(name)
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.inner.borrow().files.len()
    }

    /// Number of write handles whose content reached the file map.
    pub fn write_count(&self) -> u64 {
        self.inner.borrow().write_count
    }

    /// Mark the backing medium unavailable; `initialized()` reports
    /// false afterwards.
    pub fn deinitialize(&self) {
        self.inner.borrow_mut().deinitialized = true;
    }

    /// Make `open_write` fail until reset.
    pub fn fail_open_write(&self, fail: bool) {
        self.inner.borrow_mut().fail_open_write = fail;
    }

    /// Make `rename` fail until reset.
    pub fn fail_rename(&self, fail: bool) {
        self.inner.borrow_mut().fail_rename = fail;
    }
}

/// Buffered write handle; contents land in the file map on flush, or on
/// drop as a fallback.
struct MemWriter {
    name: String,
    buf: Vec<u8>,
    committed: bool,
    inner: Rc<RefCell<Inner>>,
}

impl MemWriter {
    fn commit(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner
            .files
            .insert(self.name.clone(), self.buf.clone());
        if !self.committed {
            inner.write_count += 1;
            self.committed = true;
        }
    }
}

impl io::Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        if !self.committed {
            self.commit();
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn initialized(&self) -> bool {
        !self.inner.borrow().deinitialized
    }

    fn open_read(&mut self, name: &str) -> Result<Box<dyn io::Read>, BackendError> {
        match self.inner.borrow().files.get(name) {
            Some(bytes) => Ok(Box::new(io::Cursor::new(bytes.clone()))),
            None => Err(BackendError::Open {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }

    fn open_write(&mut self, name: &str) -> Result<Box<dyn io::Write>, BackendError> {
        if self.inner.borrow().fail_open_write {
            return Err(BackendError::Open {
                name: name.to_string(),
                source: io::Error::other("injected open failure"),
            });
        }
        Ok(Box::new(MemWriter {
            name: name.to_string(),
            buf: Vec::new(),
            committed: false,
            inner: Rc::clone(&self.inner),
        }))
    }

    fn remove(&mut self, name: &str) -> Result<(), BackendError> {
        match self.inner.borrow_mut().files.remove(name) {
            Some(_) => Ok(()),
            None => Err(BackendError::Remove {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_rename {
            return Err(BackendError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                message: "injected rename failure".to_string(),
            });
        }
        if inner.files.contains_key(to) {
            return Err(BackendError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                message: "destination exists".to_string(),
            });
        }
        match inner.files.remove(from) {
            Some(bytes) => {
                inner.files.insert(to.to_string(), bytes);
                Ok(())
            }
            None => Err(BackendError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                message: "source does not exist".to_string(),
            }),
        }
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.borrow_mut();
        match inner.files.get(from).cloned() {
            Some(bytes) => {
                inner.files.insert(to.to_string(), bytes);
                Ok(())
            }
            None => Err(BackendError::Copy {
                from: from.to_string(),
                to: to.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}
