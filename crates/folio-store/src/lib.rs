//! Reference store for Folio.
//!
//! The store owns the working set of folder references: an insertion-ordered
//! list with no duplicates. Every mutation re-encodes the whole set and
//! commits it to durable storage in one atomic step, and a mutation whose
//! commit fails leaves the in-memory set untouched.
//!
//! # Design Rules
//!
//! 1. One writer at a time. Mutations and snapshots share a single mutex.
//! 2. Encode everything, then commit. A failed encode aborts the mutation.
//! 3. Commits replace the previous blob wholesale via temp file and rename.
//! 4. Startup never fails on bad data: unreadable blobs mean "no prior
//!    state", and undecodable or stale tokens are skipped.
//! 5. Callers only ever see snapshots, never the live collection.
//!
//! # Modules
//!
//! - [`error`]: [`StoreError`]
//! - [`key`]: Storage key defaults and validation
//! - [`archive`]: The serialized token array
//! - [`backend`]: The [`StorageBackend`] trait and [`FileStorage`]
//! - [`memory`]: [`InMemoryStorage`] for tests and embedding
//! - [`config`]: [`StoreConfig`] and [`StalePolicy`]
//! - [`store`]: [`ReferenceStore`]

pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod store;

pub use archive::{TokenArchive, ARCHIVE_FORMAT_VERSION};
pub use backend::{FileStorage, StorageBackend};
pub use config::{StalePolicy, StoreConfig, STORAGE_SUBFOLDER};
pub use error::{StoreError, StoreResult};
pub use key::{StorageKey, DEFAULT_STORAGE_KEY};
pub use memory::InMemoryStorage;
pub use store::{LoadReport, ReferenceStore};
