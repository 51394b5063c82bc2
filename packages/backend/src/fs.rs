//! Filesystem-backed storage rooted at a directory.

use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;

use crate::{BackendError, StorageBackend};

/// A [`StorageBackend`] over a directory on the local filesystem.
///
/// Every file name handed to the backend is resolved relative to the
/// root directory, which must exist and be writable when the backend is
/// constructed.
///
/// `rename` is the platform primitive. On POSIX filesystems it replaces
/// an existing destination atomically, so callers prepared for
/// non-replacing semantics simply never see a rename-over-existing
/// failure here.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Result<FsBackend, BackendError> {
        let attr = fs::metadata(&root).map_err(|error| BackendError::InvalidRoot {
            path: root.clone(),
            message: "root path could not be read".to_string(),
            source: Some(error),
        })?;

        if !attr.is_dir() {
            return Err(BackendError::InvalidRoot {
                path: root,
                message: "root path must be a directory".to_string(),
                source: None,
            });
        }

        if attr.permissions().readonly() {
            return Err(BackendError::InvalidRoot {
                path: root,
                message: "root directory must be writable".to_string(),
                source: None,
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(FsBackend { root }),
            Err(error) => Err(BackendError::InvalidRoot {
                path: root,
                message: "root path could not be canonicalized".to_string(),
                source: Some(error),
            }),
        }
    }

    /// Absolute path for a backend file name.
    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Write handle whose `flush` also syncs file contents to the medium.
struct FsWriter {
    file: fs::File,
}

impl io::Write for FsWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}

impl StorageBackend for FsBackend {
    fn initialized(&self) -> bool {
        self.root.is_dir()
    }

    fn open_read(&mut self, name: &str) -> Result<Box<dyn io::Read>, BackendError> {
        let path = self.resolve(name);
        log::debug!("opening {} for read", path.display());
        let file = fs::File::open(&path).map_err(|source| BackendError::Open {
            name: name.to_string(),
            source,
        })?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn open_write(&mut self, name: &str) -> Result<Box<dyn io::Write>, BackendError> {
        let path = self.resolve(name);
        log::debug!("opening {} for write", path.display());
        let file = fs::File::create(&path).map_err(|source| BackendError::Open {
            name: name.to_string(),
            source,
        })?;
        Ok(Box::new(FsWriter { file }))
    }

    fn remove(&mut self, name: &str) -> Result<(), BackendError> {
        fs::remove_file(self.resolve(name)).map_err(|source| BackendError::Remove {
            name: name.to_string(),
            source,
        })
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), BackendError> {
        fs::rename(self.resolve(from), self.resolve(to)).map_err(|error| BackendError::Rename {
            from: from.to_string(),
            to: to.to_string(),
            message: error.to_string(),
        })
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<(), BackendError> {
        fs::copy(self.resolve(from), self.resolve(to))
            .map(|_| ())
            .map_err(|source| BackendError::Copy {
                from: from.to_string(),
                to: to.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn new_requires_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not_a_dir");
        fs::write(&file_path, b"x").unwrap();

        assert!(FsBackend::new(PathBuf::from(dir.path())).is_ok());
        assert!(FsBackend::new(file_path).is_err());
        assert!(FsBackend::new(dir.path().join("missing")).is_err());
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FsBackend::new(PathBuf::from(dir.path())).unwrap();

        {
            let mut handle = backend.open_write("settings").unwrap();
            handle.write_all(b"hello").unwrap();
            handle.flush().unwrap();
        }

        let mut contents = String::new();
        backend
            .open_read("settings")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello");
    }

    #[test]
    fn open_read_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FsBackend::new(PathBuf::from(dir.path())).unwrap();
        assert!(backend.open_read("missing").is_err());
    }

    #[test]
    fn rename_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FsBackend::new(PathBuf::from(dir.path())).unwrap();

        backend
            .open_write("a")
            .unwrap()
            .write_all(b"payload")
            .unwrap();
        backend.rename("a", "b").unwrap();
        assert!(backend.open_read("a").is_err());
        assert!(backend.open_read("b").is_ok());

        backend.remove("b").unwrap();
        assert!(backend.open_read("b").is_err());
        assert!(backend.remove("b").is_err());
    }

    #[test]
    fn copy_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FsBackend::new(PathBuf::from(dir.path())).unwrap();

        backend.open_write("src").unwrap().write_all(b"new").unwrap();
        backend.open_write("dst").unwrap().write_all(b"old").unwrap();
        backend.copy("src", "dst").unwrap();

        let mut contents = String::new();
        backend
            .open_read("dst")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "new");
    }
}
