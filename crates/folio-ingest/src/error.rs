use std::io;
use std::time::Duration;

use folio_types::TypeError;
use thiserror::Error;

/// Why a single drop candidate produced no reference.
///
/// Scoped to that candidate; the pipeline logs it and moves on.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("no file URL representation (offered: {offered:?})")]
    UnsupportedRepresentation { offered: Vec<String> },

    #[error("failed to load item data: {0}")]
    Load(#[from] io::Error),

    #[error("item data is not a usable reference: {0}")]
    InvalidReference(#[from] TypeError),

    #[error("resolution timed out after {0:?}")]
    TimedOut(Duration),
}

/// Errors surfaced by the pipeline as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    /// The caller cancelled before every candidate was attempted.
    #[error("ingestion cancelled")]
    Cancelled,
}
