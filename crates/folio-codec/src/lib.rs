//! Durable token codec for Folio.
//!
//! Converts live [`FolderReference`]s into opaque [`DurableToken`]s that can
//! be written to disk, and back again. Tokens are sealed with a keyed BLAKE3
//! MAC, so a corrupt or foreign blob is a decode error rather than a wrong
//! path. Staleness is only discovered at decode time: a token whose folder
//! has vanished or been replaced still decodes, but is flagged stale.
//!
//! All crypto operations wrap `blake3`. There is no custom cryptography.
//!
//! # Modules
//!
//! - [`error`]: [`CodecError`]
//! - [`token`]: [`DurableToken`] and the sealed wire format
//! - [`codec`]: The [`ReferenceCodec`] trait and [`SealedCodec`]
//! - [`access`]: [`AccessLedger`] and RAII [`AccessScope`] guards
//!
//! [`FolderReference`]: folio_types::FolderReference

pub mod access;
pub mod codec;
pub mod error;
pub mod token;

pub use access::{AccessLedger, AccessScope};
pub use codec::{DecodedReference, ReferenceCodec, SealedCodec};
pub use error::{CodecError, CodecResult};
pub use token::{DurableToken, Fingerprint, TOKEN_FORMAT_VERSION};
