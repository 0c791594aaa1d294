use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("store error: {0}")]
    Store(#[from] folio_store::StoreError),

    #[error("ingest error: {0}")]
    Ingest(#[from] folio_ingest::IngestError),

    #[error("invalid reference: {0}")]
    Reference(#[from] folio_types::TypeError),

    #[error("folder is not managed: {}", .0.display())]
    NotManaged(PathBuf),

    #[error("folder is unavailable: {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
