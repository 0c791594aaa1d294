use folio_codec::CodecError;

/// Errors from reference store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The durable write (or read) failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// A reference in the set could not be encoded, so nothing was written.
    #[error("encoding error: {0}")]
    Encoding(#[from] CodecError),

    /// The token archive could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The storage key cannot be used as a file name.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidStorageKey { key: String, reason: String },

    /// No per-user support directory could be determined.
    #[error("no application support directory available")]
    NoSupportDirectory,

    /// Storage backend is read-only.
    #[error("storage is read-only")]
    ReadOnly,

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Returns `true` for failures of the durable write itself.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::ReadOnly)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
