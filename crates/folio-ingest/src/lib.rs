//! Concurrent drop ingestion for Folio.
//!
//! A drop hands over a batch of opaque item providers. The pipeline resolves
//! each one into a [`FolderReference`] on its own task, applies the caller's
//! [`FilterRules`], and reassembles the survivors in declaration order with
//! within-batch duplicates removed. Individual failures only shrink the
//! result; the batch as a whole never fails.
//!
//! [`FolderReference`]: folio_types::FolderReference
//! [`FilterRules`]: folio_types::FilterRules

pub mod candidate;
pub mod error;
pub mod pipeline;
pub mod resolver;

pub use candidate::{BytesItem, DropCandidate, ItemProvider};
pub use error::{IngestError, ResolutionFailure};
pub use pipeline::{IngestConfig, IngestPipeline};
pub use resolver::{CandidateResolver, FileUrlResolver};
