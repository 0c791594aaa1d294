//! Turning a drop candidate into a folder reference.

use async_trait::async_trait;
use folio_types::{FolderReference, FILE_URL_TYPE};

use crate::candidate::DropCandidate;
use crate::error::ResolutionFailure;

/// Capability that resolves one opaque drop candidate.
///
/// Injected into the pipeline so the core never depends on a particular
/// drag-and-drop toolkit.
#[async_trait]
pub trait CandidateResolver: Send + Sync {
    async fn resolve(&self, candidate: DropCandidate) -> Result<FolderReference, ResolutionFailure>;
}

/// Resolves candidates that carry a file URL representation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileUrlResolver;

#[async_trait]
impl CandidateResolver for FileUrlResolver {
    async fn resolve(&self, candidate: DropCandidate) -> Result<FolderReference, ResolutionFailure> {
        let provider = candidate.provider();
        if !provider.conforms_to(FILE_URL_TYPE) {
            return Err(ResolutionFailure::UnsupportedRepresentation {
                offered: provider.type_identifiers(),
            });
        }
        let data = provider.load_data(FILE_URL_TYPE).await?;
        Ok(FolderReference::from_url_bytes(&data)?)
    }
}
