use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::key::{StorageKey, DEFAULT_STORAGE_KEY};

/// Fixed subfolder of the support directory that holds all archives.
pub const STORAGE_SUBFOLDER: &str = "FolderManager";

/// What to do with tokens that are stale at startup. Undecodable tokens are
/// always kept on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Hide them from the in-memory set but leave them on disk until the
    /// next mutation rewrites the archive.
    #[default]
    Retain,
    /// Rewrite the archive without them right after loading.
    Prune,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Overrides the per-user support directory.
    pub storage_dir: Option<PathBuf>,
    pub storage_key: String,
    pub stale_policy: StalePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            stale_policy: StalePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at an explicit directory, with the default key.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn key(&self) -> StoreResult<StorageKey> {
        StorageKey::parse(&self.storage_key)
    }

    /// Directory the archive lives in: `<support dir>/FolderManager`.
    pub fn resolve_dir(&self) -> StoreResult<PathBuf> {
        let base = match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("org", "folio", "Folio")
                .map(|p| p.data_dir().to_path_buf())
                .ok_or(StoreError::NoSupportDirectory)?,
        };
        Ok(base.join(STORAGE_SUBFOLDER))
    }
}
