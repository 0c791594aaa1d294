//! In-memory storage backend for testing and ephemeral use.
//!
//! [`InMemoryStorage`] keeps the committed blob behind a `RwLock`. It can be
//! switched to read-only to simulate a full disk or revoked permissions,
//! which is how the store's rollback behaviour is exercised in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};

/// An in-memory implementation of [`StorageBackend`].
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    blob: RwLock<Option<Vec<u8>>>,
    read_only: AtomicBool,
    commits: AtomicUsize,
}

impl InMemoryStorage {
    /// Create an empty backend with nothing committed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that already holds `bytes`, as if a previous run had
    /// committed them.
    pub fn with_blob(bytes: Vec<u8>) -> Self {
        Self {
            blob: RwLock::new(Some(bytes)),
            ..Self::default()
        }
    }

    /// Make every subsequent commit fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Copy of the committed blob.
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.read().ok().and_then(|b| b.clone())
    }
}

impl StorageBackend for InMemoryStorage {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        let blob = self.blob.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(blob.clone())
    }

    fn commit(&self, bytes: &[u8]) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let mut blob = self.blob.write().map_err(|_| StoreError::LockPoisoned)?;
        *blob = Some(bytes.to_vec());
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}
