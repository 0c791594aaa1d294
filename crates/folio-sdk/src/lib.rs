//! High-level SDK for Folio.
//!
//! [`FolderManager`] ties the reference store, the drop ingestion pipeline,
//! and the access ledger together behind the four operations a front end
//! needs: add dropped folders, remove one, pick one through a dialog, and
//! list the working set.

pub mod config;
pub mod dialog;
pub mod error;
pub mod manager;

pub use config::FolioConfig;
pub use dialog::{DialogAdapter, PickOutcome, PickRequest};
pub use error::{SdkError, SdkResult};
pub use manager::FolderManager;

// Re-export key types
pub use folio_codec::AccessScope;
pub use folio_ingest::{BytesItem, DropCandidate, IngestConfig, ItemProvider};
pub use folio_store::{LoadReport, ReferenceStore, StalePolicy, StoreConfig};
pub use folio_types::{ContentKind, FilterRules, FolderReference};
