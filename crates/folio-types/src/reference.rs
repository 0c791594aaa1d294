//! The [`FolderReference`] value type.
//!
//! A reference is an absolute path that has been lexically normalized on
//! construction, so two references name the same folder exactly when their
//! paths are equal. Nothing here touches the filesystem.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TypeError;

/// Type identifier a drop provider must declare for its payload to be read
/// as a file URL.
pub const FILE_URL_TYPE: &str = "public.file-url";

/// A resolved, directly usable folder location.
///
/// Immutable once created. Identity is equality of the normalized path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct FolderReference(PathBuf);

impl FolderReference {
    /// Create a reference from an absolute path.
    ///
    /// `.` components are dropped, `..` is collapsed lexically, and trailing
    /// or doubled separators disappear.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TypeError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(TypeError::EmptyPath);
        }
        if !path.is_absolute() {
            return Err(TypeError::RelativePath(path.display().to_string()));
        }
        Ok(Self(normalize(path)))
    }

    /// Parse a `file://` URL, or a bare absolute path, into a reference.
    pub fn from_file_url(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        if raw.is_empty() {
            return Err(TypeError::EmptyPath);
        }
        // Schemes are case-insensitive.
        let is_file_url = raw.get(..5).is_some_and(|s| s.eq_ignore_ascii_case("file:"));
        if !is_file_url {
            return Self::new(raw);
        }

        let url = Url::parse(raw).map_err(|e| TypeError::InvalidFileUrl(format!("{raw}: {e}")))?;
        let path = url
            .to_file_path()
            .map_err(|()| TypeError::InvalidFileUrl(raw.to_string()))?;
        Self::new(path)
    }

    /// Parse the raw data representation of a file URL, as handed over by a
    /// drop provider.
    pub fn from_url_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| TypeError::InvalidFileUrl(format!("not UTF-8: {e}")))?;
        Self::from_file_url(text)
    }

    /// The normalized path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Consume the reference and return the owned path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Render the reference as a `file://` URL.
    pub fn to_file_url(&self) -> Result<Url, TypeError> {
        Url::from_file_path(&self.0).map_err(|()| TypeError::InvalidFileUrl(self.to_string()))
    }

    /// Last path component, or the whole path for a root.
    pub fn display_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

impl TryFrom<PathBuf> for FolderReference {
    type Error = TypeError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl From<FolderReference> for PathBuf {
    fn from(reference: FolderReference) -> Self {
        reference.0
    }
}

impl AsRef<Path> for FolderReference {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for FolderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FolderReference({})", self.0.display())
    }
}

impl fmt::Display for FolderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
