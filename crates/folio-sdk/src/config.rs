use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use folio_ingest::IngestConfig;
use folio_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Top-level configuration, usually read from a TOML file.
///
/// ```toml
/// token_secret = "change me"
///
/// [store]
/// storage_key = "work"
/// stale_policy = "prune"
///
/// [ingest]
/// max_in_flight = 8
/// resolve_timeout_ms = 2000
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Secret the token key is derived from. Defaults to the canonical
    /// storage directory path, which ties tokens to where they are stored.
    pub token_secret: Option<String>,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

impl FolioConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Bytes the codec key is derived from.
    ///
    /// Without a `token_secret` this is the storage directory with symlinks
    /// and relative components resolved, so every spelling of the same
    /// directory yields the same key.
    pub fn codec_secret(&self) -> SdkResult<Vec<u8>> {
        match &self.token_secret {
            Some(secret) => Ok(secret.as_bytes().to_vec()),
            None => {
                let dir = self.store.resolve_dir()?;
                let dir = canonical_dir(&dir)
                    .map_err(|e| SdkError::Config(format!("{}: {e}", dir.display())))?;
                Ok(dir.to_string_lossy().into_owned().into_bytes())
            }
        }
    }
}

/// Canonicalize the deepest existing ancestor of `dir` and re-append the
/// components that do not exist yet.
fn canonical_dir(dir: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(dir)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing) {
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::StalePolicy;
    use std::time::Duration;

    #[test]
    fn empty_document_gives_defaults() {
        let c = FolioConfig::from_toml_str("").unwrap();
        assert_eq!(c.store.storage_key, "folderBookmarks");
        assert_eq!(c.ingest.max_in_flight, 16);
        assert!(c.ingest.resolve_timeout().is_none());
        assert!(c.token_secret.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let c = FolioConfig::from_toml_str(
            r#"
            token_secret = "s3cret"

            [store]
            storage_dir = "/var/lib/folio"
            storage_key = "work"
            stale_policy = "prune"

            [ingest]
            max_in_flight = 4
            resolve_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(c.store.stale_policy, StalePolicy::Prune);
        assert_eq!(c.store.key().unwrap().file_name(), "work.bin");
        assert_eq!(c.ingest.max_in_flight, 4);
        assert_eq!(c.ingest.resolve_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(c.codec_secret().unwrap(), b"s3cret");
    }

    fn fallback_secret(dir: impl Into<PathBuf>) -> Vec<u8> {
        FolioConfig {
            store: StoreConfig::in_dir(dir),
            ..FolioConfig::default()
        }
        .codec_secret()
        .unwrap()
    }

    #[test]
    fn secret_falls_back_to_storage_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = fs::canonicalize(tmp.path()).unwrap().join("x").join("FolderManager");
        assert_eq!(
            fallback_secret(tmp.path().join("x")),
            expected.to_string_lossy().as_bytes()
        );
    }

    #[test]
    fn secret_ignores_how_the_directory_is_spelled() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("y")).unwrap();
        assert_eq!(
            fallback_secret(tmp.path().join("x")),
            fallback_secret(tmp.path().join("y").join("..").join("x"))
        );
        assert_ne!(
            fallback_secret(tmp.path().join("x")),
            fallback_secret(tmp.path().join("y"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn secret_follows_symlinked_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();
        assert_eq!(
            fallback_secret(tmp.path().join("real")),
            fallback_secret(tmp.path().join("link"))
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = FolioConfig::from_toml_str("[store\nstorage_key = 1").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        fs::write(&path, "[store]\nstorage_key = \"photos\"\n").unwrap();
        let c = FolioConfig::load(&path).unwrap();
        assert_eq!(c.store.storage_key, "photos");

        assert!(FolioConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
