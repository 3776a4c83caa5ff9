// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BuildFile, RawBuildFile};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// File name looked up when `--file` is not given.
pub const DEFAULT_BUILD_FILE: &str = "Pipework.toml";

/// Read and parse a build file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBuildFile> {
    load_from_path_with(&RealFileSystem, path)
}

/// As [`load_from_path`], reading through `fs`.
pub fn load_from_path_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawBuildFile> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let raw = parse_str(&contents)?;
    debug!(path = %path.display(), tasks = raw.task.len(), "loaded build file");
    Ok(raw)
}

pub fn parse_str(contents: &str) -> Result<RawBuildFile> {
    Ok(toml::from_str(contents)?)
}

/// Read, parse and validate a build file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildFile> {
    BuildFile::try_from(load_from_path(path)?)
}

/// As [`load_and_validate`], reading through `fs`.
pub fn load_and_validate_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<BuildFile> {
    BuildFile::try_from(load_from_path_with(fs, path)?)
}

/// `Pipework.toml` in the current working directory.
pub fn default_build_file_path() -> PathBuf {
    PathBuf::from(DEFAULT_BUILD_FILE)
}
