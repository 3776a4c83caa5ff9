// src/files/builder.rs

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::errors::{PipeworkError, Result};
use crate::files::Files;
use crate::fs::{FileSystem, RealFileSystem};
use crate::paths::AbsolutePath;

/// Mutable staging area for a [`Files`].
///
/// Paths are checked for containment as they are added; sorting and
/// de-duplication happen once in [`FilesBuilder::build`]. After `build` the
/// builder is frozen and every further call fails with
/// [`PipeworkError::BuilderFrozen`].
#[derive(Debug)]
pub struct FilesBuilder {
    directory: AbsolutePath,
    files: Vec<PathBuf>,
    built: bool,
}

impl FilesBuilder {
    pub fn new(directory: AbsolutePath) -> Self {
        Self {
            directory,
            files: Vec::new(),
            built: false,
        }
    }

    pub fn directory(&self) -> &AbsolutePath {
        &self.directory
    }

    /// Add one path. Relative paths are taken relative to the builder's
    /// directory; either way the result must be a proper descendant of it.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.ensure_open()?;
        let relative = self.relative(path.as_ref())?;
        self.files.push(relative);
        Ok(self)
    }

    pub fn add_all<I, P>(&mut self, paths: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.add(path)?;
        }
        Ok(self)
    }

    /// Add every file of `other`. Its files must live under this builder's
    /// directory, wherever `other` itself is rooted.
    pub fn merge(&mut self, other: &Files) -> Result<&mut Self> {
        self.ensure_open()?;
        for absolute in other.absolute_paths() {
            self.add(absolute)?;
        }
        Ok(self)
    }

    /// Write `content` to `path` on the real filesystem and add it.
    pub fn write(&mut self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<AbsolutePath> {
        self.write_with(&RealFileSystem, path, content)
    }

    /// Like [`FilesBuilder::write`], through the given filesystem.
    pub fn write_with(
        &mut self,
        fs: &dyn FileSystem,
        path: impl AsRef<Path>,
        content: impl AsRef<[u8]>,
    ) -> Result<AbsolutePath> {
        self.ensure_open()?;
        let relative = self.relative(path.as_ref())?;
        let absolute = self.directory.join(&relative);
        trace!(path = %absolute, "writing file");
        fs.write(&absolute, content.as_ref())?;
        self.files.push(relative);
        Ok(absolute)
    }

    /// Freeze the builder and produce the sorted, de-duplicated [`Files`].
    pub fn build(&mut self) -> Result<Files> {
        self.ensure_open()?;
        self.built = true;

        let mut files = std::mem::take(&mut self.files);
        files.sort();
        files.dedup();
        Ok(Files::from_sorted(self.directory.clone(), files))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.built {
            Err(PipeworkError::BuilderFrozen)
        } else {
            Ok(())
        }
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        self.directory
            .join(path)
            .relative_to(&self.directory)
            .ok_or_else(|| PipeworkError::PathOutsideDirectory {
                path: path.to_path_buf(),
                directory: self.directory.to_path_buf(),
            })
    }
}
