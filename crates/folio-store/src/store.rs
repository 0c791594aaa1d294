//! The [`ReferenceStore`]: the ordered working set and its persistence.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use folio_codec::{DurableToken, ReferenceCodec};
use folio_types::FolderReference;
use tracing::{debug, info, warn};

use crate::archive::TokenArchive;
use crate::backend::{FileStorage, StorageBackend};
use crate::config::{StalePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// What happened while loading the archive at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// References that made it into the set.
    pub loaded: usize,
    /// Tokens that decoded but were stale.
    pub stale: usize,
    /// Tokens that failed to decode.
    pub undecodable: usize,
    /// Tokens that duplicated an earlier entry.
    pub duplicates: usize,
}

impl LoadReport {
    /// Number of stored tokens that did not make it into the set.
    pub fn dropped(&self) -> usize {
        self.stale + self.undecodable + self.duplicates
    }
}

/// Owner of the working set of folder references.
///
/// All mutations and snapshots are serialized through one mutex, which is
/// held across the encode and the durable commit. Two stores pointed at the
/// same storage are not coordinated with each other.
pub struct ReferenceStore {
    set: Mutex<Vec<FolderReference>>,
    /// Tokens this codec could not open. They are written back unchanged so
    /// a key mismatch never erases them.
    carried: Vec<DurableToken>,
    backend: Arc<dyn StorageBackend>,
    codec: Arc<dyn ReferenceCodec>,
    report: LoadReport,
}

impl std::fmt::Debug for ReferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceStore")
            .field("location", &self.backend.location())
            .field("report", &self.report)
            .finish()
    }
}

impl ReferenceStore {
    /// Open a store over `backend`, loading whatever was last committed.
    ///
    /// Loading never fails: a missing or unreadable archive yields an empty
    /// set, and bad or stale tokens are skipped.
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        codec: Arc<dyn ReferenceCodec>,
        stale_policy: StalePolicy,
    ) -> Self {
        let (references, carried, report) = load(backend.as_ref(), codec.as_ref());

        let store = Self {
            set: Mutex::new(references),
            carried,
            backend,
            codec,
            report,
        };

        info!(
            location = %store.backend.location(),
            loaded = report.loaded,
            dropped = report.dropped(),
            "reference store opened"
        );

        if stale_policy == StalePolicy::Prune && report.stale + report.duplicates > 0 {
            if let Err(e) = store.rewrite() {
                warn!(error = %e, "failed to prune dropped tokens");
            }
        }

        store
    }

    /// Open a file-backed store as described by `config`.
    pub fn open_file(config: &StoreConfig, codec: Arc<dyn ReferenceCodec>) -> StoreResult<Self> {
        let key = config.key()?;
        let dir = config.resolve_dir()?;
        let backend = Arc::new(FileStorage::new(dir, &key));
        Ok(Self::open(backend, codec, config.stale_policy))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<FolderReference>>> {
        self.set.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Encode `existing` followed by `added` and commit them, returning the
    /// set that was written.
    ///
    /// An existing member that no longer encodes is dropped. A reference in
    /// `added` that fails to encode aborts the commit. Any failure leaves
    /// storage as it was.
    fn persist(
        &self,
        existing: &[FolderReference],
        added: &[FolderReference],
    ) -> StoreResult<Vec<FolderReference>> {
        let mut kept = Vec::with_capacity(existing.len() + added.len());
        let mut tokens = self.carried.clone();
        tokens.reserve(existing.len() + added.len());

        for reference in existing {
            match self.codec.encode(reference) {
                Ok(token) => {
                    tokens.push(token);
                    kept.push(reference.clone());
                }
                Err(e) => {
                    warn!(path = %reference, error = %e, "dropping folder that can no longer be encoded");
                }
            }
        }
        for reference in added {
            tokens.push(self.codec.encode(reference)?);
            kept.push(reference.clone());
        }

        let bytes = TokenArchive::new(tokens).to_bytes()?;
        self.backend.commit(&bytes)?;
        Ok(kept)
    }

    fn rewrite(&self) -> StoreResult<()> {
        let mut set = self.lock()?;
        let next = self.persist(&set, &[])?;
        *set = next;
        info!(total = set.len(), "archive rewritten without stale tokens");
        Ok(())
    }

    /// Add every reference not already present, in the given order, then
    /// persist.
    ///
    /// Returns the references actually added. If nothing is new, nothing is
    /// written. If persisting fails the set is left exactly as before.
    pub fn add(
        &self,
        references: impl IntoIterator<Item = FolderReference>,
    ) -> StoreResult<Vec<FolderReference>> {
        let mut set = self.lock()?;

        let mut seen: HashSet<FolderReference> = set.iter().cloned().collect();
        let added: Vec<FolderReference> = references
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();

        if added.is_empty() {
            debug!("add: nothing new");
            return Ok(added);
        }

        let next = self.persist(&set, &added)?;
        *set = next;

        info!(added = added.len(), total = set.len(), "folders added");
        Ok(added)
    }

    /// Remove every entry equal to `reference`, then persist.
    ///
    /// Returns `Ok(false)` without writing if nothing matched.
    pub fn remove(&self, reference: &FolderReference) -> StoreResult<bool> {
        let mut set = self.lock()?;
        if !set.contains(reference) {
            return Ok(false);
        }

        let remaining: Vec<FolderReference> =
            set.iter().filter(|r| *r != reference).cloned().collect();
        let next = self.persist(&remaining, &[])?;
        *set = next;

        info!(path = %reference, total = set.len(), "folder removed");
        Ok(true)
    }

    /// Snapshot of the current set, in insertion order.
    pub fn list(&self) -> StoreResult<Vec<FolderReference>> {
        Ok(self.lock()?.clone())
    }

    pub fn contains(&self, reference: &FolderReference) -> StoreResult<bool> {
        Ok(self.lock()?.contains(reference))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Startup statistics.
    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    /// Where the archive lives.
    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Archive path for file-backed stores opened from a config.
    pub fn storage_path(config: &StoreConfig) -> StoreResult<PathBuf> {
        Ok(config.resolve_dir()?.join(config.key()?.file_name()))
    }
}

type Loaded = (Vec<FolderReference>, Vec<DurableToken>, LoadReport);

fn load(backend: &dyn StorageBackend, codec: &dyn ReferenceCodec) -> Loaded {
    let mut report = LoadReport::default();

    let bytes = match backend.load() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!(location = %backend.location(), "no prior state");
            return (Vec::new(), Vec::new(), report);
        }
        Err(e) => {
            warn!(location = %backend.location(), error = %e, "archive unreadable; starting empty");
            return (Vec::new(), Vec::new(), report);
        }
    };

    let archive = match TokenArchive::from_bytes(&bytes) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(location = %backend.location(), error = %e, "archive corrupt; starting empty");
            return (Vec::new(), Vec::new(), report);
        }
    };

    let mut references = Vec::with_capacity(archive.tokens.len());
    let mut carried = Vec::new();
    let mut seen = HashSet::new();
    for (index, token) in archive.tokens.into_iter().enumerate() {
        match codec.decode(&token) {
            Ok(decoded) if decoded.is_stale => {
                debug!(index, path = %decoded.reference, "skipping stale token");
                report.stale += 1;
            }
            Ok(decoded) => {
                if seen.insert(decoded.reference.clone()) {
                    references.push(decoded.reference);
                } else {
                    report.duplicates += 1;
                }
            }
            Err(e) => {
                warn!(index, error = %e, "failed to decode stored token");
                report.undecodable += 1;
                carried.push(token);
            }
        }
    }

    report.loaded = references.len();
    (references, carried, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStorage;
    use folio_codec::SealedCodec;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
        storage: Arc<InMemoryStorage>,
        codec: Arc<SealedCodec>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                storage: Arc::new(InMemoryStorage::new()),
                codec: Arc::new(SealedCodec::new(b"store-tests")),
            }
        }

        fn folder(&self, name: &str) -> FolderReference {
            let path = self.dir.path().join(name);
            fs::create_dir_all(&path).unwrap();
            FolderReference::new(path).unwrap()
        }

        fn open(&self, policy: StalePolicy) -> ReferenceStore {
            ReferenceStore::open(self.storage.clone(), self.codec.clone(), policy)
        }
    }

    #[test]
    fn empty_storage_opens_empty() {
        let fx = Fixture::new();
        let store = fx.open(StalePolicy::Retain);
        assert!(store.is_empty().unwrap());
        assert_eq!(store.load_report(), LoadReport::default());
        assert_eq!(fx.storage.commit_count(), 0);
    }

    #[test]
    fn add_appends_in_order_and_persists() {
        let fx = Fixture::new();
        let (a, b, c) = (fx.folder("a"), fx.folder("b"), fx.folder("c"));
        let store = fx.open(StalePolicy::Retain);

        store.add([b.clone(), a.clone()]).unwrap();
        store.add([c.clone()]).unwrap();
        assert_eq!(store.list().unwrap(), vec![b.clone(), a.clone(), c.clone()]);

        let reopened = fx.open(StalePolicy::Retain);
        assert_eq!(reopened.list().unwrap(), vec![b, a, c]);
        assert_eq!(reopened.load_report().loaded, 3);
    }

    #[test]
    fn add_existing_is_noop_without_write() {
        let fx = Fixture::new();
        let a = fx.folder("a");
        let store = fx.open(StalePolicy::Retain);

        assert_eq!(store.add([a.clone()]).unwrap(), vec![a.clone()]);
        assert_eq!(fx.storage.commit_count(), 1);

        assert!(store.add([a.clone()]).unwrap().is_empty());
        assert_eq!(fx.storage.commit_count(), 1);
        assert_eq!(store.list().unwrap(), vec![a]);
    }

    #[test]
    fn add_collapses_duplicates_within_call() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        let store = fx.open(StalePolicy::Retain);

        let added = store.add([a.clone(), b.clone(), a.clone()]).unwrap();
        assert_eq!(added, vec![a.clone(), b.clone()]);
        assert_eq!(store.list().unwrap(), vec![a, b]);
    }

    #[test]
    fn failed_commit_rolls_back_add() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone()]).unwrap();
        let committed = fx.storage.blob();

        fx.storage.set_read_only(true);
        let err = store.add([b]).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.list().unwrap(), vec![a]);
        assert_eq!(fx.storage.blob(), committed);
    }

    #[test]
    fn failed_commit_rolls_back_remove() {
        let fx = Fixture::new();
        let a = fx.folder("a");
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone()]).unwrap();

        fx.storage.set_read_only(true);
        assert!(store.remove(&a).is_err());
        assert_eq!(store.list().unwrap(), vec![a]);
    }

    #[test]
    fn unencodable_reference_aborts_add() {
        let fx = Fixture::new();
        let a = fx.folder("a");
        let ghost = FolderReference::new(fx.dir.path().join("never-created")).unwrap();
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone()]).unwrap();

        let err = store.add([ghost]).unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));
        assert_eq!(store.list().unwrap(), vec![a]);
        assert_eq!(fx.storage.commit_count(), 1);
    }

    #[test]
    fn dead_member_is_dropped_on_next_add() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone()]).unwrap();

        fs::remove_dir(a.path()).unwrap();
        assert_eq!(store.add([b.clone()]).unwrap(), vec![b.clone()]);
        assert_eq!(store.list().unwrap(), vec![b.clone()]);

        let bytes = fx.storage.blob().unwrap();
        assert_eq!(TokenArchive::from_bytes(&bytes).unwrap().tokens.len(), 1);
        assert_eq!(fx.open(StalePolicy::Retain).list().unwrap(), vec![b]);
    }

    #[test]
    fn dead_member_is_dropped_on_remove_of_another() {
        let fx = Fixture::new();
        let (a, b, c) = (fx.folder("a"), fx.folder("b"), fx.folder("c"));
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone(), b.clone(), c.clone()]).unwrap();

        fs::remove_dir(b.path()).unwrap();
        assert!(store.remove(&a).unwrap());
        assert_eq!(store.list().unwrap(), vec![c.clone()]);
        assert_eq!(fx.open(StalePolicy::Retain).list().unwrap(), vec![c]);
    }

    #[test]
    fn remove_drops_entry_and_persists() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        let store = fx.open(StalePolicy::Retain);
        store.add([a.clone(), b.clone()]).unwrap();

        assert!(store.remove(&a).unwrap());
        assert!(!store.remove(&a).unwrap());
        assert_eq!(fx.storage.commit_count(), 2);
        assert_eq!(fx.open(StalePolicy::Retain).list().unwrap(), vec![b]);
    }

    #[test]
    fn stale_tokens_are_skipped_but_retained_on_disk() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        fx.open(StalePolicy::Retain).add([a.clone(), b.clone()]).unwrap();
        let before = fx.storage.blob();

        fs::remove_dir(a.path()).unwrap();
        let store = fx.open(StalePolicy::Retain);
        assert_eq!(store.list().unwrap(), vec![b]);
        assert_eq!(store.load_report().stale, 1);
        assert_eq!(fx.storage.blob(), before);
    }

    #[test]
    fn prune_policy_rewrites_without_stale_tokens() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        fx.open(StalePolicy::Retain).add([a.clone(), b.clone()]).unwrap();

        fs::remove_dir(a.path()).unwrap();
        let store = fx.open(StalePolicy::Prune);
        assert_eq!(store.list().unwrap(), vec![b.clone()]);

        let bytes = fx.storage.blob().unwrap();
        assert_eq!(TokenArchive::from_bytes(&bytes).unwrap().tokens.len(), 1);
    }

    #[test]
    fn undecodable_tokens_are_skipped() {
        let fx = Fixture::new();
        let a = fx.folder("a");
        let good = fx.codec.encode(&a).unwrap();
        let archive = TokenArchive::new(vec![
            DurableToken::from_bytes(b"garbage".to_vec()),
            good,
        ]);
        let storage = Arc::new(InMemoryStorage::with_blob(archive.to_bytes().unwrap()));

        let store = ReferenceStore::open(storage, fx.codec.clone(), StalePolicy::Retain);
        assert_eq!(store.list().unwrap(), vec![a]);
        assert_eq!(store.load_report().undecodable, 1);
    }

    #[test]
    fn undecodable_tokens_survive_later_writes() {
        let fx = Fixture::new();
        let (a, b) = (fx.folder("a"), fx.folder("b"));
        fx.open(StalePolicy::Retain).add([a.clone()]).unwrap();
        let commits = fx.storage.commit_count();

        let foreign = ReferenceStore::open(
            fx.storage.clone(),
            Arc::new(SealedCodec::new(b"some-other-key")),
            StalePolicy::Prune,
        );
        assert!(foreign.is_empty().unwrap());
        assert_eq!(foreign.load_report().undecodable, 1);
        assert_eq!(fx.storage.commit_count(), commits);

        foreign.add([b.clone()]).unwrap();
        let bytes = fx.storage.blob().unwrap();
        assert_eq!(TokenArchive::from_bytes(&bytes).unwrap().tokens.len(), 2);

        let store = fx.open(StalePolicy::Retain);
        assert_eq!(store.list().unwrap(), vec![a]);
        assert_eq!(store.load_report().undecodable, 1);
    }

    #[test]
    fn corrupt_archive_starts_empty() {
        let fx = Fixture::new();
        let storage = Arc::new(InMemoryStorage::with_blob(vec![0xde, 0xad]));
        let store = ReferenceStore::open(storage, fx.codec.clone(), StalePolicy::Retain);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let fx = Fixture::new();
        let a = fx.folder("a");
        let config = StoreConfig::in_dir(fx.dir.path().join("support"));

        let store = ReferenceStore::open_file(&config, fx.codec.clone()).unwrap();
        store.add([a.clone()]).unwrap();
        assert!(ReferenceStore::storage_path(&config).unwrap().exists());

        let reopened = ReferenceStore::open_file(&config, fx.codec.clone()).unwrap();
        assert_eq!(reopened.list().unwrap(), vec![a]);
    }

    #[test]
    fn concurrent_adds_do_not_lose_updates() {
        use std::thread;

        let fx = Fixture::new();
        let folders: Vec<_> = (0..8).map(|i| fx.folder(&format!("f{i}"))).collect();
        let store = Arc::new(fx.open(StalePolicy::Retain));

        let handles: Vec<_> = folders
            .iter()
            .cloned()
            .map(|f| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.add([f]).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let reopened = fx.open(StalePolicy::Retain);
        let mut persisted = reopened.list().unwrap();
        persisted.sort();
        let mut expected = folders;
        expected.sort();
        assert_eq!(persisted, expected);
    }
}
