//! Error types for token encoding and decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the reference codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A durable token could not be minted for the reference.
    #[error("cannot encode {}: {reason}", path.display())]
    Encoding { path: PathBuf, reason: String },

    /// The token is corrupt, truncated, foreign, or of an unknown version.
    #[error("cannot decode token: {0}")]
    Decoding(String),
}

/// Convenience alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
