//! Drop candidates and the item-provider capability behind them.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use folio_types::FILE_URL_TYPE;
use url::Url;

/// An opaque item handed over by a drag-and-drop source.
///
/// Providers declare which representations they can produce and load each
/// one asynchronously on request.
#[async_trait]
pub trait ItemProvider: Send + Sync {
    /// Type identifiers this item can be loaded as, most specific first.
    fn type_identifiers(&self) -> Vec<String>;

    fn conforms_to(&self, type_identifier: &str) -> bool {
        self.type_identifiers().iter().any(|t| t == type_identifier)
    }

    /// Load the raw bytes of the given representation.
    async fn load_data(&self, type_identifier: &str) -> io::Result<Vec<u8>>;
}

/// A not-yet-validated drop item.
///
/// Consumed by value, exactly once, by the ingestion pipeline.
pub struct DropCandidate {
    provider: Box<dyn ItemProvider>,
}

impl DropCandidate {
    pub fn new(provider: impl ItemProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    /// Candidate carrying the file URL of `path`.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self::new(BytesItem::for_path(path))
    }

    pub fn provider(&self) -> &dyn ItemProvider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for DropCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropCandidate")
            .field("types", &self.provider.type_identifiers())
            .finish()
    }
}

/// An item whose data is already in memory, optionally delivered late.
#[derive(Clone, Debug)]
pub struct BytesItem {
    types: Vec<String>,
    data: Vec<u8>,
    delay: Option<Duration>,
}

impl BytesItem {
    pub fn new(types: impl IntoIterator<Item = impl Into<String>>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            data: data.into(),
            delay: None,
        }
    }

    /// Item offering `url` as its file URL representation.
    pub fn file_url(url: &str) -> Self {
        Self::new([FILE_URL_TYPE], url.as_bytes())
    }

    /// Item offering the file URL of `path`. Paths that cannot be expressed
    /// as a URL are passed through verbatim and left for the resolver to
    /// reject.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Url::from_file_path(path) {
            Ok(url) => Self::file_url(url.as_str()),
            Err(()) => Self::new([FILE_URL_TYPE], path.to_string_lossy().as_bytes()),
        }
    }

    /// Wait `delay` before handing over the data.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ItemProvider for BytesItem {
    fn type_identifiers(&self) -> Vec<String> {
        self.types.clone()
    }

    async fn load_data(&self, type_identifier: &str) -> io::Result<Vec<u8>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.conforms_to(type_identifier) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("no {type_identifier} representation"),
            ));
        }
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bytes_item_serves_declared_type_only() {
        let item = BytesItem::file_url("file:///srv/a");
        assert!(item.conforms_to(FILE_URL_TYPE));
        assert_eq!(item.load_data(FILE_URL_TYPE).await.unwrap(), b"file:///srv/a");
        assert!(item.load_data("public.png").await.is_err());
    }

    #[test]
    fn for_path_encodes_url() {
        let item = BytesItem::for_path("/srv/my folder");
        assert_eq!(item.data, b"file:///srv/my%20folder");
    }

    #[test]
    fn relative_path_is_passed_through() {
        let item = BytesItem::for_path("relative/dir");
        assert_eq!(item.data, b"relative/dir");
    }

    #[test]
    fn debug_lists_types() {
        let candidate = DropCandidate::for_path("/srv/a");
        assert!(format!("{candidate:?}").contains(FILE_URL_TYPE));
    }
}
