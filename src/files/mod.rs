// src/files/mod.rs

//! The value passed between pipeline stages.
//!
//! - [`Files`] is an immutable, sorted, de-duplicated set of relative paths
//!   rooted at one absolute directory. Cloning is cheap (shared storage).
//! - [`FilesBuilder`] is the only way to create one.
//! - [`find`] walks a directory and collects files matching globs.

pub mod builder;
pub mod find;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use builder::FilesBuilder;
pub use find::{find, FindOptions};

use crate::paths::AbsolutePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Files {
    directory: AbsolutePath,
    files: Arc<[PathBuf]>,
}

impl Files {
    /// Start collecting files rooted at `directory`.
    pub fn builder(directory: AbsolutePath) -> FilesBuilder {
        FilesBuilder::new(directory)
    }

    /// An empty set rooted at `directory`.
    pub fn empty(directory: AbsolutePath) -> Files {
        Files {
            directory,
            files: Arc::from(Vec::new()),
        }
    }

    /// Only called by `FilesBuilder::build`, which guarantees the invariants.
    pub(crate) fn from_sorted(directory: AbsolutePath, files: Vec<PathBuf>) -> Files {
        Files {
            directory,
            files: Arc::from(files),
        }
    }

    pub fn directory(&self) -> &AbsolutePath {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Relative paths, in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> + '_ {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Absolute paths, in the same order as [`Files::iter`].
    pub fn absolute_paths(&self) -> impl Iterator<Item = AbsolutePath> + '_ {
        self.files.iter().map(|rel| self.directory.join(rel))
    }

    /// `(relative, absolute)` pairs.
    pub fn path_mappings(&self) -> impl Iterator<Item = (&Path, AbsolutePath)> + '_ {
        self.files
            .iter()
            .map(|rel| (rel.as_path(), self.directory.join(rel)))
    }

    /// Whether `path` (relative to the directory, or absolute) is in the set.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let absolute = self.directory.join(path);
        match absolute.relative_to(&self.directory) {
            Some(rel) => self.files.binary_search(&rel).is_ok(),
            None => false,
        }
    }

    /// An owned copy of the relative paths.
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.files.to_vec()
    }
}

impl<'a> IntoIterator for &'a Files {
    type Item = &'a Path;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, PathBuf>, fn(&PathBuf) -> &Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter().map(PathBuf::as_path as fn(&PathBuf) -> &Path)
    }
}
