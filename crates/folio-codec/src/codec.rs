//! The [`ReferenceCodec`] trait and its sealed implementation.

use std::fs;
use std::io;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use folio_types::FolderReference;
use tracing::debug;

use crate::access::AccessLedger;
use crate::error::{CodecError, CodecResult};
use crate::token::{DurableToken, Fingerprint, Sealer, TokenPayload};

/// Result of decoding a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedReference {
    pub reference: FolderReference,
    /// The token decoded, but its folder is gone or has been replaced. The
    /// caller decides what to do with it.
    pub is_stale: bool,
    /// Wall-clock time the token was minted, in milliseconds since the epoch.
    pub minted_at_ms: u64,
}

/// Converts between live references and durable tokens.
///
/// Implementations must be side-effect-free and thread-safe. They never
/// filter stale entries themselves.
pub trait ReferenceCodec: Send + Sync {
    /// Mint a token for `reference`.
    fn encode(&self, reference: &FolderReference) -> CodecResult<DurableToken>;

    /// Turn a token back into a reference, reporting staleness.
    fn decode(&self, token: &DurableToken) -> CodecResult<DecodedReference>;
}

/// Codec producing MAC-sealed tokens bound to the folder's filesystem
/// identity.
pub struct SealedCodec {
    sealer: Sealer,
    access: Arc<AccessLedger>,
}

impl SealedCodec {
    /// Create a codec whose sealing key is derived from `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_access(secret, Arc::new(AccessLedger::new()))
    }

    /// Create a codec that records its metadata reads in a shared ledger.
    pub fn with_access(secret: &[u8], access: Arc<AccessLedger>) -> Self {
        Self {
            sealer: Sealer::new(secret),
            access,
        }
    }

    pub fn access_ledger(&self) -> &Arc<AccessLedger> {
        &self.access
    }
}

impl ReferenceCodec for SealedCodec {
    fn encode(&self, reference: &FolderReference) -> CodecResult<DurableToken> {
        let meta = {
            let _scope = self.access.acquire(reference);
            fs::metadata(reference.path()).map_err(|e| CodecError::Encoding {
                path: reference.path().to_path_buf(),
                reason: e.to_string(),
            })?
        };

        let payload = TokenPayload {
            path: reference.path().to_path_buf(),
            fingerprint: Fingerprint::of(&meta),
            minted_at_ms: now_ms(),
        };
        self.sealer.seal(&payload)
    }

    fn decode(&self, token: &DurableToken) -> CodecResult<DecodedReference> {
        let payload = self.sealer.open(token)?;
        let reference = FolderReference::new(&payload.path)
            .map_err(|e| CodecError::Decoding(e.to_string()))?;

        let is_stale = match fs::metadata(reference.path()) {
            Ok(meta) => Fingerprint::of(&meta) != payload.fingerprint,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %reference, error = %e, "token target unreadable");
                }
                true
            }
        };

        Ok(DecodedReference {
            reference,
            is_stale,
            minted_at_ms: payload.minted_at_ms,
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
