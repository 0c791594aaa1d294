use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("folder reference must not be empty")]
    EmptyPath,

    #[error("folder reference must be absolute: {0}")]
    RelativePath(String),

    #[error("invalid file URL: {0}")]
    InvalidFileUrl(String),

    #[error("unknown content kind: {0}")]
    UnknownKind(String),
}
