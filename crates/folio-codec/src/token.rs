//! The sealed durable token format.
//!
//! On-disk format:
//! ```text
//! [1 byte:   format version]
//! [32 bytes: keyed BLAKE3 MAC over the payload, domain-separated]
//! [N bytes:  payload (bincode-serialized TokenPayload)]
//! ```

use std::fmt;
use std::fs::Metadata;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Current token format version.
pub const TOKEN_FORMAT_VERSION: u8 = 1;

const MAC_LEN: usize = 32;
const HEADER_LEN: usize = 1 + MAC_LEN;

/// Domain tag mixed into every MAC so tokens can't be confused with other
/// keyed hashes made from the same secret.
const SEAL_DOMAIN: &str = "folio-token-v1";

/// Context string for deriving the sealing key from a user secret.
const KEY_CONTEXT: &str = "folio 2025-02-27 durable token sealing key";

/// Opaque, persistable encoding of a folder reference.
///
/// Callers treat the bytes as a black box. Only a codec holding the same
/// sealing key can turn them back into a reference.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurableToken(Vec<u8>);

impl DurableToken {
    /// Wrap raw bytes read from storage. No validation happens until decode.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DurableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mac = self.0.get(1..9).map(hex::encode).unwrap_or_default();
        write!(f, "DurableToken(len={}, mac={mac})", self.0.len())
    }
}

/// Filesystem identity of the folder a token was minted for.
///
/// If the path later resolves to an item with a different fingerprint, the
/// original folder was replaced and the token is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub device: u64,
    pub inode: u64,
}

impl Fingerprint {
    #[cfg(unix)]
    pub fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            device: meta.dev(),
            inode: meta.ino(),
        }
    }

    // No stable file id outside unix; creation time is the closest proxy.
    #[cfg(not(unix))]
    pub fn of(meta: &Metadata) -> Self {
        let created = meta
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            device: 0,
            inode: created,
        }
    }
}

/// Sealed contents of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub minted_at_ms: u64,
}

/// Seals and opens token payloads with a derived key.
pub(crate) struct Sealer {
    key: [u8; 32],
}

impl Sealer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret),
        }
    }

    fn mac(&self, payload: &[u8]) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(SEAL_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(payload);
        hasher.finalize()
    }

    pub fn seal(&self, payload: &TokenPayload) -> CodecResult<DurableToken> {
        let body = bincode::serialize(payload).map_err(|e| CodecError::Encoding {
            path: payload.path.clone(),
            reason: e.to_string(),
        })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.push(TOKEN_FORMAT_VERSION);
        bytes.extend_from_slice(self.mac(&body).as_bytes());
        bytes.extend_from_slice(&body);
        Ok(DurableToken(bytes))
    }

    pub fn open(&self, token: &DurableToken) -> CodecResult<TokenPayload> {
        let bytes = token.as_bytes();
        if bytes.len() <= HEADER_LEN {
            return Err(CodecError::Decoding(format!(
                "token too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0] != TOKEN_FORMAT_VERSION {
            return Err(CodecError::Decoding(format!(
                "unsupported token version {}",
                bytes[0]
            )));
        }

        let mut expected = [0u8; MAC_LEN];
        expected.copy_from_slice(&bytes[1..HEADER_LEN]);
        let body = &bytes[HEADER_LEN..];

        // blake3::Hash equality is constant-time.
        if self.mac(body) != blake3::Hash::from(expected) {
            return Err(CodecError::Decoding("MAC mismatch".into()));
        }

        bincode::deserialize(body).map_err(|e| CodecError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TokenPayload {
        TokenPayload {
            path: PathBuf::from("/srv/projects"),
            fingerprint: Fingerprint {
                device: 7,
                inode: 42,
            },
            minted_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn seal_then_open() {
        let sealer = Sealer::new(b"secret");
        let token = sealer.seal(&payload()).unwrap();
        assert_eq!(token.as_bytes()[0], TOKEN_FORMAT_VERSION);
        assert_eq!(sealer.open(&token).unwrap(), payload());
    }

    #[test]
    fn flipped_bit_fails_mac() {
        let sealer = Sealer::new(b"secret");
        let mut bytes = sealer.seal(&payload()).unwrap().into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = sealer.open(&DurableToken::from_bytes(bytes)).unwrap_err();
        assert!(err.to_string().contains("MAC mismatch"));
    }

    #[test]
    fn different_secret_cannot_open() {
        let token = Sealer::new(b"alpha").seal(&payload()).unwrap();
        assert!(Sealer::new(b"beta").open(&token).is_err());
    }

    #[test]
    fn rejects_short_and_unknown_version() {
        let sealer = Sealer::new(b"secret");
        assert!(sealer.open(&DurableToken::from_bytes(vec![1, 2, 3])).is_err());

        let mut bytes = sealer.seal(&payload()).unwrap().into_bytes();
        bytes[0] = 99;
        let err = sealer.open(&DurableToken::from_bytes(bytes)).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let token = Sealer::new(b"secret").seal(&payload()).unwrap();
        let rendered = format!("{token:?}");
        assert!(rendered.starts_with("DurableToken(len="));
        assert!(rendered.len() < 64);
    }
}
