//! Content kinds and filesystem probing.
//!
//! [`ContentKind`] is what a caller asks for ("directories only", "`.png`
//! files"); [`ContentType`] is what a path actually is. Conformance follows
//! a small hierarchy: everything conforms to [`ContentKind::Item`], and an
//! extension kind only ever matches regular files.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A kind of content a reference may be required to conform to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Any existing filesystem item.
    Item,
    /// A directory (symlinks to directories included).
    Directory,
    /// A regular file.
    RegularFile,
    /// A symbolic link, whatever it points at.
    Symlink,
    /// A regular file with the given lowercase extension (no leading dot).
    Extension(String),
}

impl ContentKind {
    /// Build an extension kind, normalizing case and stripping a leading `.`.
    pub fn extension(ext: &str) -> Self {
        Self::Extension(ext.trim_start_matches('.').to_ascii_lowercase())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => f.write_str("item"),
            Self::Directory => f.write_str("directory"),
            Self::RegularFile => f.write_str("file"),
            Self::Symlink => f.write_str("symlink"),
            Self::Extension(ext) => write!(f, ".{ext}"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = TypeError;

    /// Accepts `item`, `directory`/`folder`, `file`, `symlink`, and `.ext`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "item" | "any" => Ok(Self::Item),
            "directory" | "folder" | "dir" => Ok(Self::Directory),
            "file" | "regular_file" => Ok(Self::RegularFile),
            "symlink" | "link" => Ok(Self::Symlink),
            ext if ext.len() > 1 && ext.starts_with('.') => Ok(Self::extension(ext)),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}

/// Coarse type of what a path resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseKind {
    Directory,
    RegularFile,
    Other,
}

/// The concrete content type of a path, read from filesystem metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub base: BaseKind,
    pub is_symlink: bool,
    /// Lowercased extension of the final component, if any.
    pub extension: Option<String>,
}

impl ContentType {
    /// Query the filesystem for the content type of `path`.
    ///
    /// Symlinks are followed for the base kind; a dangling link is an error.
    pub fn probe(path: &Path) -> io::Result<Self> {
        let link_meta = fs::symlink_metadata(path)?;
        let meta = if link_meta.file_type().is_symlink() {
            fs::metadata(path)?
        } else {
            link_meta.clone()
        };

        let base = if meta.is_dir() {
            BaseKind::Directory
        } else if meta.is_file() {
            BaseKind::RegularFile
        } else {
            BaseKind::Other
        };

        Ok(Self {
            base,
            is_symlink: link_meta.file_type().is_symlink(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase()),
        })
    }

    /// Returns `true` if this type conforms to `kind`.
    pub fn conforms_to(&self, kind: &ContentKind) -> bool {
        match kind {
            ContentKind::Item => true,
            ContentKind::Directory => self.base == BaseKind::Directory,
            ContentKind::RegularFile => self.base == BaseKind::RegularFile,
            ContentKind::Symlink => self.is_symlink,
            ContentKind::Extension(ext) => {
                self.base == BaseKind::RegularFile && self.extension.as_deref() == Some(ext)
            }
        }
    }

    /// Returns `true` if this type conforms to at least one of `kinds`.
    pub fn conforms_to_any(&self, kinds: &[ContentKind]) -> bool {
        kinds.iter().any(|k| self.conforms_to(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names() {
        assert_eq!("folder".parse::<ContentKind>().unwrap(), ContentKind::Directory);
        assert_eq!(" File ".parse::<ContentKind>().unwrap(), ContentKind::RegularFile);
        assert_eq!(
            ".PNG".parse::<ContentKind>().unwrap(),
            ContentKind::Extension("png".into())
        );
        assert!(matches!(".".parse::<ContentKind>(), Err(TypeError::UnknownKind(_))));
        assert!("socket".parse::<ContentKind>().is_err());
    }

    #[test]
    fn probes_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Notes.MD");
        fs::write(&file, b"# notes").unwrap();

        let dir_type = ContentType::probe(dir.path()).unwrap();
        assert!(dir_type.conforms_to(&ContentKind::Directory));
        assert!(dir_type.conforms_to(&ContentKind::Item));
        assert!(!dir_type.conforms_to(&ContentKind::RegularFile));

        let file_type = ContentType::probe(&file).unwrap();
        assert!(file_type.conforms_to(&ContentKind::RegularFile));
        assert!(file_type.conforms_to(&ContentKind::extension("md")));
        assert!(!file_type.conforms_to(&ContentKind::extension("txt")));
        assert!(!file_type.conforms_to_any(&[ContentKind::Directory, ContentKind::Symlink]));
    }

    #[test]
    fn missing_path_fails_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentType::probe(&dir.path().join("absent")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_both() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let t = ContentType::probe(&link).unwrap();
        assert!(t.is_symlink);
        assert!(t.conforms_to(&ContentKind::Directory));
        assert!(t.conforms_to(&ContentKind::Symlink));
    }
}
