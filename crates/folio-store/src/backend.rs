//! The [`StorageBackend`] trait and the file-backed implementation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreResult;
use crate::key::StorageKey;

/// Durable home of the serialized reference set.
///
/// Implementations must be thread-safe and must make `commit` atomic: after
/// a crash, `load` returns either the previous blob or the new one, never a
/// mix.
pub trait StorageBackend: Send + Sync {
    /// Read the last committed blob.
    ///
    /// Returns `Ok(None)` if nothing has ever been committed.
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the committed blob with `bytes`.
    fn commit(&self, bytes: &[u8]) -> StoreResult<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Stores the archive as one file, committed via temp file and rename.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Archive file for `key` inside `dir`. The directory is created lazily
    /// on first commit.
    pub fn new(dir: impl AsRef<Path>, key: &StorageKey) -> Self {
        Self::at(dir.as_ref().join(key.file_name()))
    }

    /// Archive file at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&self, bytes: &[u8]) -> StoreResult<()> {
        let dir = self.parent();
        fs::create_dir_all(dir)?;

        // The temp file must live in the same directory for the rename to be
        // atomic.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        sync_dir(dir);

        debug!(path = %self.path.display(), len = bytes.len(), "archive committed");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// Make the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
