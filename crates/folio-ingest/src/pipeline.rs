//! The concurrent ingestion pipeline.
//!
//! One task per candidate is spawned into a [`JoinSet`], bounded by a
//! semaphore. Each task reports back with its declaration index, and the
//! result is reassembled from a fixed slot vector, so the output order never
//! depends on which candidate finished first.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use folio_types::{FilterRules, FolderReference};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::candidate::DropCandidate;
use crate::error::{IngestError, ResolutionFailure};
use crate::resolver::{CandidateResolver, FileUrlResolver};

/// Configuration for the [`IngestPipeline`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum number of candidates resolved at once.
    pub max_in_flight: usize,
    /// Per-candidate resolution deadline in milliseconds. `None` waits
    /// indefinitely.
    pub resolve_timeout_ms: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            resolve_timeout_ms: None,
        }
    }
}

impl IngestConfig {
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_ms.map(Duration::from_millis)
    }
}

/// Resolves, filters, and deduplicates drop batches.
#[derive(Clone)]
pub struct IngestPipeline {
    resolver: Arc<dyn CandidateResolver>,
    config: IngestConfig,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .finish()
    }
}

impl IngestPipeline {
    pub fn new(resolver: Arc<dyn CandidateResolver>, config: IngestConfig) -> Self {
        Self { resolver, config }
    }

    /// Pipeline using [`FileUrlResolver`].
    pub fn file_urls(config: IngestConfig) -> Self {
        Self::new(Arc::new(FileUrlResolver), config)
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Resolve and filter every candidate, returning the survivors in
    /// declaration order with duplicates removed.
    ///
    /// Never fails: candidates that cannot be resolved, time out, or are
    /// rejected by `rules` are dropped. Dropping the returned future aborts
    /// all outstanding candidate tasks.
    pub async fn ingest(
        &self,
        candidates: Vec<DropCandidate>,
        rules: &FilterRules,
    ) -> Vec<FolderReference> {
        let total = candidates.len();
        if total == 0 {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let timeout = self.config.resolve_timeout();
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let rules = rules.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, None);
                };
                (index, admit(index, resolver, candidate, rules, timeout).await)
            });
        }

        let mut slots: Vec<Option<FolderReference>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = outcome,
                Err(e) => warn!(error = %e, "ingest task did not complete"),
            }
        }

        let accepted = dedupe(slots);
        info!(candidates = total, accepted = accepted.len(), "drop batch ingested");
        accepted
    }

    /// Like [`ingest`](Self::ingest), but gives up as soon as `cancel`
    /// completes. On cancellation every outstanding task is aborted and no
    /// partial result is returned.
    pub async fn ingest_until<C>(
        &self,
        candidates: Vec<DropCandidate>,
        rules: &FilterRules,
        cancel: C,
    ) -> Result<Vec<FolderReference>, IngestError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            accepted = self.ingest(candidates, rules) => Ok(accepted),
            () = cancel => {
                info!("drop batch ingestion cancelled");
                Err(IngestError::Cancelled)
            }
        }
    }
}

/// Resolve one candidate and run it through the filter.
async fn admit(
    index: usize,
    resolver: Arc<dyn CandidateResolver>,
    candidate: DropCandidate,
    rules: FilterRules,
    timeout: Option<Duration>,
) -> Option<FolderReference> {
    let resolving = resolver.resolve(candidate);
    let resolved = match timeout {
        Some(limit) => tokio::time::timeout(limit, resolving)
            .await
            .unwrap_or_else(|_| Err(ResolutionFailure::TimedOut(limit))),
        None => resolving.await,
    };

    let reference = match resolved {
        Ok(reference) => reference,
        Err(e) => {
            debug!(index, error = %e, "candidate dropped");
            return None;
        }
    };

    // The kind check stats the filesystem.
    let probe = reference.clone();
    match tokio::task::spawn_blocking(move || rules.allows(&probe)).await {
        Ok(true) => Some(reference),
        Ok(false) => {
            debug!(index, path = %reference, "candidate rejected by filter");
            None
        }
        Err(e) => {
            warn!(index, path = %reference, error = %e, "filter evaluation failed");
            None
        }
    }
}

fn dedupe(slots: Vec<Option<FolderReference>>) -> Vec<FolderReference> {
    let mut seen = HashSet::new();
    slots
        .into_iter()
        .flatten()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}
