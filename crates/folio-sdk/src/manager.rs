use std::fs;
use std::future::Future;
use std::sync::Arc;

use folio_codec::{AccessLedger, AccessScope, SealedCodec};
use folio_ingest::{DropCandidate, IngestPipeline};
use folio_store::ReferenceStore;
use folio_types::{FilterRules, FolderReference};
use tracing::debug;

use crate::config::FolioConfig;
use crate::dialog::{DialogAdapter, PickRequest};
use crate::error::{SdkError, SdkResult};

/// High-level folder set API.
pub struct FolderManager {
    store: Arc<ReferenceStore>,
    pipeline: IngestPipeline,
    access: Arc<AccessLedger>,
}

impl std::fmt::Debug for FolderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderManager")
            .field("store", &self.store)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl FolderManager {
    /// Open the file-backed folder set described by `config`.
    pub fn open(config: &FolioConfig) -> SdkResult<Self> {
        let access = Arc::new(AccessLedger::new());
        let secret = config.codec_secret()?;
        let codec = Arc::new(SealedCodec::with_access(&secret, Arc::clone(&access)));
        let store = ReferenceStore::open_file(&config.store, codec)?;
        let pipeline = IngestPipeline::file_urls(config.ingest.clone());
        Ok(Self::with_parts(Arc::new(store), pipeline, access))
    }

    pub fn with_parts(
        store: Arc<ReferenceStore>,
        pipeline: IngestPipeline,
        access: Arc<AccessLedger>,
    ) -> Self {
        Self {
            store,
            pipeline,
            access,
        }
    }

    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.store
    }

    pub fn access_ledger(&self) -> &Arc<AccessLedger> {
        &self.access
    }

    // ---- Mutations ----

    /// Ingest a drop batch and add the accepted folders.
    ///
    /// Returns the folders that were actually new. Candidates that fail to
    /// resolve or are filtered out are skipped silently; only a failure to
    /// persist is an error.
    pub async fn add_folders(
        &self,
        candidates: Vec<DropCandidate>,
        rules: &FilterRules,
    ) -> SdkResult<Vec<FolderReference>> {
        let accepted = self.pipeline.ingest(candidates, rules).await;
        self.commit_accepted(accepted).await
    }

    /// Like [`add_folders`](Self::add_folders), abandoning the batch if
    /// `cancel` completes before ingestion does. A cancelled batch adds
    /// nothing.
    pub async fn add_folders_until<C>(
        &self,
        candidates: Vec<DropCandidate>,
        rules: &FilterRules,
        cancel: C,
    ) -> SdkResult<Vec<FolderReference>>
    where
        C: Future<Output = ()>,
    {
        let accepted = self.pipeline.ingest_until(candidates, rules, cancel).await?;
        self.commit_accepted(accepted).await
    }

    async fn commit_accepted(
        &self,
        accepted: Vec<FolderReference>,
    ) -> SdkResult<Vec<FolderReference>> {
        if accepted.is_empty() {
            return Ok(Vec::new());
        }
        // The commit does blocking file I/O.
        let store = Arc::clone(&self.store);
        let added = tokio::task::spawn_blocking(move || store.add(accepted))
            .await
            .map_err(|e| SdkError::Internal(e.to_string()))??;
        debug!(accepted = added.len(), "drop batch committed");
        Ok(added)
    }

    pub fn remove_folder(&self, reference: &FolderReference) -> SdkResult<bool> {
        Ok(self.store.remove(reference)?)
    }

    /// Ask `dialog` for one folder and add it if it passes `rules`.
    ///
    /// Returns the picked folder, whether or not it was already in the set.
    /// A dismissed dialog or a rejected pick returns `Ok(None)`.
    pub fn pick_folder(
        &self,
        dialog: &dyn DialogAdapter,
        rules: &FilterRules,
    ) -> SdkResult<Option<FolderReference>> {
        let outcome = dialog.choose(&PickRequest::from_rules(rules));
        let Some(path) = outcome.accepted() else {
            debug!("pick dismissed");
            return Ok(None);
        };

        let reference = FolderReference::new(path)?;
        if !rules.allows(&reference) {
            debug!(path = %reference, "pick rejected by filter");
            return Ok(None);
        }

        self.store.add([reference.clone()])?;
        Ok(Some(reference))
    }

    // ---- Queries ----

    pub fn list_folders(&self) -> SdkResult<Vec<FolderReference>> {
        Ok(self.store.list()?)
    }

    /// Start accessing a managed folder's contents.
    ///
    /// Access lasts until the returned scope is dropped. Fails for folders
    /// outside the set and for folders that are no longer reachable; in the
    /// latter case the scope is released before returning.
    pub fn open_folder(&self, reference: &FolderReference) -> SdkResult<AccessScope> {
        if !self.store.contains(reference)? {
            return Err(SdkError::NotManaged(reference.path().to_path_buf()));
        }
        let scope = self.access.acquire(reference);
        fs::read_dir(scope.path()).map_err(|source| SdkError::Unavailable {
            path: reference.path().to_path_buf(),
            source,
        })?;
        Ok(scope)
    }
}
