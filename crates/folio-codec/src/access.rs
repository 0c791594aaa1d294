//! Security-scoped access to referenced folders.
//!
//! Any code that reads a referenced folder first acquires an [`AccessScope`]
//! from the shared [`AccessLedger`]. The scope is released when the guard is
//! dropped, on every exit path including errors and unwinding. The ledger
//! keeps per-path counts so nested scopes on the same folder balance out.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use folio_types::FolderReference;
use tracing::trace;

/// Tracks open access scopes per folder.
#[derive(Debug, Default)]
pub struct AccessLedger {
    open: Mutex<HashMap<FolderReference, usize>>,
}

impl AccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the counts intact, so a poisoned
    // lock is still safe to use.
    fn counts(&self) -> MutexGuard<'_, HashMap<FolderReference, usize>> {
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start accessing `reference`. Access stops when the scope is dropped.
    pub fn acquire(self: &Arc<Self>, reference: &FolderReference) -> AccessScope {
        let depth = {
            let mut counts = self.counts();
            let entry = counts.entry(reference.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        trace!(path = %reference, depth, "access scope acquired");
        AccessScope {
            ledger: Arc::clone(self),
            reference: reference.clone(),
        }
    }

    fn release(&self, reference: &FolderReference) {
        let mut counts = self.counts();
        if let Some(n) = counts.get_mut(reference) {
            *n -= 1;
            if *n == 0 {
                counts.remove(reference);
            }
        }
        trace!(path = %reference, "access scope released");
    }

    /// Number of open scopes on `reference`.
    pub fn open_count(&self, reference: &FolderReference) -> usize {
        self.counts().get(reference).copied().unwrap_or(0)
    }

    /// Number of open scopes across all folders.
    pub fn total_open(&self) -> usize {
        self.counts().values().sum()
    }
}

/// RAII guard for access to one folder.
#[derive(Debug)]
#[must_use = "access stops as soon as the scope is dropped"]
pub struct AccessScope {
    ledger: Arc<AccessLedger>,
    reference: FolderReference,
}

impl AccessScope {
    pub fn reference(&self) -> &FolderReference {
        &self.reference
    }

    pub fn path(&self) -> &Path {
        self.reference.path()
    }
}

impl Drop for AccessScope {
    fn drop(&mut self) {
        self.ledger.release(&self.reference);
    }
}
