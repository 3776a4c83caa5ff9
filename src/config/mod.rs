// src/config/mod.rs

//! Build files for the command-line runner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a build file from disk (`loader.rs`).
//! - Validate names, references and globs (`validate.rs`).
//! - Compile the tasks into a [`BuildDefinition`](crate::build::BuildDefinition)
//!   (`compile.rs`).

pub mod compile;
pub mod loader;
pub mod model;
pub mod validate;

pub use compile::compile_build_file;
pub use loader::{
    default_build_file_path, load_and_validate, load_and_validate_with, load_from_path,
    load_from_path_with, parse_str, DEFAULT_BUILD_FILE,
};
pub use model::{BuildFile, RawBuildFile, TaskConfig};
pub use validate::validate_raw_build_file;
