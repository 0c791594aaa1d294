//! The durable archive: a single serialized array of tokens.
//!
//! Encoded with bincode. The archive is rewritten wholesale on every commit;
//! there is no incremental diffing.

use folio_codec::DurableToken;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Current archive format version.
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// The serialized form of the reference set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenArchive {
    pub format_version: u32,
    pub tokens: Vec<DurableToken>,
}

impl TokenArchive {
    pub fn new(tokens: Vec<DurableToken>) -> Self {
        Self {
            format_version: ARCHIVE_FORMAT_VERSION,
            tokens,
        }
    }

    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let archive: Self =
            bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if archive.format_version != ARCHIVE_FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported archive version {}",
                archive.format_version
            )));
        }
        Ok(archive)
    }
}
