//! Filter policy applied to every candidate reference, dropped or picked.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::kind::{ContentKind, ContentType};
use crate::reference::FolderReference;

/// User-supplied acceptance test.
pub type Predicate = Arc<dyn Fn(&FolderReference) -> bool + Send + Sync>;

/// Allowed content kinds plus an optional predicate.
///
/// An empty `allowed_kinds` accepts any kind. Rules are stateless and cheap
/// to clone, so one value can be shared across concurrent ingestions.
#[derive(Clone, Default)]
pub struct FilterRules {
    pub allowed_kinds: Vec<ContentKind>,
    pub predicate: Option<Predicate>,
}

impl FilterRules {
    /// Rules that accept everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Rules that accept directories only.
    pub fn directories() -> Self {
        Self::any().with_kinds([ContentKind::Directory])
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ContentKind>) -> Self {
        self.allowed_kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&FolderReference) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Returns `true` if `reference` passes both the kind check and the
    /// predicate.
    ///
    /// The kind check reads filesystem metadata. If that fails the reference
    /// matches no kind, so it is rejected whenever kinds are restricted.
    pub fn allows(&self, reference: &FolderReference) -> bool {
        self.kind_allowed(reference) && self.predicate.as_ref().map_or(true, |p| p(reference))
    }

    fn kind_allowed(&self, reference: &FolderReference) -> bool {
        if self.allowed_kinds.is_empty() {
            return true;
        }
        match ContentType::probe(reference.path()) {
            Ok(content_type) => content_type.conforms_to_any(&self.allowed_kinds),
            Err(e) => {
                debug!(path = %reference, error = %e, "content type probe failed");
                false
            }
        }
    }
}

impl fmt::Debug for FilterRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRules")
            .field("allowed_kinds", &self.allowed_kinds)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
