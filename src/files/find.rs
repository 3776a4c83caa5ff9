// src/files/find.rs

//! Glob-based file discovery.
//!
//! Patterns are matched against paths relative to the search directory,
//! always with `/` separators, so `src/**/*.rs` behaves the same on every
//! platform.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::errors::Result;
use crate::files::{Files, FilesBuilder};
use crate::fs::FileSystem;
use crate::paths::AbsolutePath;

/// Options for [`find`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Glob patterns; a file matching any of them is skipped.
    pub ignore: Vec<String>,
}

impl FindOptions {
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }
}

/// Collect every file under `directory` matching at least one of `globs` and
/// none of the ignore patterns.
pub fn find<S: AsRef<str>>(
    fs: &dyn FileSystem,
    directory: &AbsolutePath,
    globs: &[S],
    options: &FindOptions,
) -> Result<Files> {
    let include = build_globset(globs)?;
    let ignore = build_globset(&options.ignore)?;

    let mut builder = FilesBuilder::new(directory.clone());
    if fs.is_dir(directory) {
        walk(fs, directory, directory.as_path(), &include, &ignore, &mut builder)?;
    } else {
        debug!(directory = %directory, "search directory does not exist; nothing found");
    }

    let files = builder.build()?;
    debug!(directory = %directory, count = files.len(), "find complete");
    Ok(files)
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // `*` stays within one path component; `**` crosses them.
        let glob = GlobBuilder::new(pattern.as_ref())
            .literal_separator(true)
            .build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn walk(
    fs: &dyn FileSystem,
    root: &AbsolutePath,
    dir: &Path,
    include: &GlobSet,
    ignore: &GlobSet,
    builder: &mut FilesBuilder,
) -> Result<()> {
    let mut entries = fs.read_dir(dir)?;
    entries.sort();

    for entry in entries {
        if fs.is_dir(&entry) {
            // Linked directories are not descended into; a link back to an
            // ancestor would otherwise be walked until the OS gives up.
            if fs.is_symlink(&entry) {
                trace!(path = %entry.display(), "skipping linked directory");
            } else {
                walk(fs, root, &entry, include, ignore, builder)?;
            }
            continue;
        }
        if !fs.is_file(&entry) {
            continue;
        }

        let Some(relative) = root.join(&entry).relative_to(root) else {
            continue;
        };
        let key = slash_path(&relative);
        if include.is_match(&key) && !ignore.is_match(&key) {
            trace!(path = %key, "matched");
            builder.add(relative)?;
        }
    }
    Ok(())
}

fn slash_path(path: &Path) -> String {
    path.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
