//! Storage key handling.
//!
//! The storage key doubles as the archive's file name, so it must be a
//! single plain path component:
//! - Blank (after trimming) falls back to [`DEFAULT_STORAGE_KEY`]
//! - Must not contain `/`, `\`, NUL or other control characters
//! - Must not contain `..` and must not be `.`
//!
//! Keys without an extension get `.bin` appended for the file name.

use std::fmt;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

/// Key used when none (or a blank one) is supplied.
pub const DEFAULT_STORAGE_KEY: &str = "folderBookmarks";

const DEFAULT_EXTENSION: &str = "bin";

/// A validated storage key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Trim and validate `raw`, falling back to the default when blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_store::key::StorageKey;
    ///
    /// assert_eq!(StorageKey::parse("  ").unwrap().as_str(), "folderBookmarks");
    /// assert_eq!(StorageKey::parse(" work ").unwrap().file_name(), "work.bin");
    /// assert!(StorageKey::parse("../escape").is_err());
    /// ```
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let key = raw.trim();
        if key.is_empty() {
            return Ok(Self::default());
        }

        let invalid = |reason: &str| StoreError::InvalidStorageKey {
            key: key.to_string(),
            reason: reason.into(),
        };

        if key.contains(['/', '\\']) {
            return Err(invalid("must not contain path separators"));
        }
        if key.chars().any(char::is_control) {
            return Err(invalid("must not contain control characters"));
        }
        if key == "." || key.contains("..") {
            return Err(invalid("must not be '.' or contain '..'"));
        }

        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_STORAGE_KEY
    }

    /// File name of the archive for this key.
    pub fn file_name(&self) -> String {
        if Path::new(&self.0).extension().is_some() {
            self.0.clone()
        } else {
            format!("{}.{DEFAULT_EXTENSION}", self.0)
        }
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        Self(DEFAULT_STORAGE_KEY.to_string())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_use_default() {
        for raw in ["", "   ", "\t\n"] {
            let key = StorageKey::parse(raw).unwrap();
            assert!(key.is_default());
            assert_eq!(key.file_name(), "folderBookmarks.bin");
        }
    }

    #[test]
    fn keys_are_trimmed() {
        let key = StorageKey::parse("  projects  ").unwrap();
        assert_eq!(key.as_str(), "projects");
        assert!(!key.is_default());
    }

    #[test]
    fn explicit_extension_is_kept() {
        assert_eq!(
            StorageKey::parse("folders.plist").unwrap().file_name(),
            "folders.plist"
        );
        assert_eq!(StorageKey::parse(".hidden").unwrap().file_name(), ".hidden.bin");
    }

    #[test]
    fn rejects_path_like_keys() {
        assert!(StorageKey::parse("a/b").is_err());
        assert!(StorageKey::parse("a\\b").is_err());
        assert!(StorageKey::parse("..").is_err());
        assert!(StorageKey::parse(".").is_err());
        assert!(StorageKey::parse("a..b").is_err());
        assert!(StorageKey::parse("bad\0key").is_err());
    }

    #[test]
    fn error_names_the_key() {
        let err = StorageKey::parse(" a/b ").unwrap_err();
        assert!(err.to_string().contains("\"a/b\""));
    }
}
