//! Foundation types for Folio.
//!
//! Every other Folio crate depends on `folio-types`. It holds the value types
//! that flow between the codec, the store, and the ingestion pipeline, plus
//! the filter policy, which is a pure leaf with no knowledge of storage.
//!
//! # Key Types
//!
//! - [`FolderReference`]: A resolved, normalized, absolute folder location
//! - [`ContentKind`]: A kind a reference may be required to conform to
//! - [`ContentType`]: The concrete kind of a path, probed from the filesystem
//! - [`FilterRules`]: Allowed kinds plus an optional user predicate

pub mod error;
pub mod filter;
pub mod kind;
pub mod reference;

pub use error::TypeError;
pub use filter::{FilterRules, Predicate};
pub use kind::{BaseKind, ContentKind, ContentType};
pub use reference::{FolderReference, FILE_URL_TYPE};
