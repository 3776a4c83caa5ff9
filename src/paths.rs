// src/paths.rs

//! Absolute path handling.
//!
//! Every path stored in a [`Files`](crate::files::Files) or exposed by a
//! [`Run`](crate::run::Run) is an [`AbsolutePath`]: absolute, and lexically
//! normalized (no `.` or `..` components). Normalization is pure path
//! arithmetic; nothing here touches the filesystem.

use std::fmt;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipeworkError, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct AbsolutePath(PathBuf);

impl AbsolutePath {
    /// Wrap an absolute path, normalizing it.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(PipeworkError::InvalidPath(format!(
                "{} is not absolute",
                path.display()
            )));
        }
        Ok(Self(normalize(path)))
    }

    /// The process working directory.
    pub fn current_dir() -> Result<Self> {
        Self::new(std::env::current_dir()?)
    }

    /// Resolve `path` against this directory. Absolute inputs are only
    /// normalized.
    pub fn join(&self, path: impl AsRef<Path>) -> AbsolutePath {
        let path = path.as_ref();
        if path.is_absolute() {
            AbsolutePath(normalize(path))
        } else {
            AbsolutePath(normalize(&self.0.join(path)))
        }
    }

    /// Parent directory, or `None` at the filesystem root.
    pub fn parent(&self) -> Option<AbsolutePath> {
        self.0.parent().map(|p| AbsolutePath(p.to_path_buf()))
    }

    /// If `self` is a proper descendant of `directory`, the relative path from
    /// `directory` to `self`.
    pub fn relative_to(&self, directory: &AbsolutePath) -> Option<PathBuf> {
        let relative = self.0.strip_prefix(&directory.0).ok()?;
        if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative.to_path_buf())
        }
    }

    /// Deepest directory containing both paths.
    pub fn common_ancestor(&self, other: &AbsolutePath) -> AbsolutePath {
        let mut common = PathBuf::new();
        for (a, b) in self.0.components().zip(other.0.components()) {
            if a != b {
                break;
            }
            common.push(a.as_os_str());
        }
        AbsolutePath(common)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for AbsolutePath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for AbsolutePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

impl TryFrom<PathBuf> for AbsolutePath {
    type Error = PipeworkError;

    fn try_from(path: PathBuf) -> Result<Self> {
        AbsolutePath::new(path)
    }
}

impl From<AbsolutePath> for PathBuf {
    fn from(path: AbsolutePath) -> Self {
        path.0
    }
}

/// Lexically normalize a path: drop `.` and fold `..` into the parent.
///
/// `..` at the root is discarded, matching how absolute paths resolve.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
        }
    }
    out
}
