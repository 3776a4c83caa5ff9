// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Build file as read from TOML, before validation.
///
/// ```toml
/// [task.lint]
/// find = ["src/**/*.rs"]
/// directory = "@"
/// cmd = "rustfmt --check"
/// pass_files = true
///
/// [task.default]
/// after = ["lint", "test"]
/// parallel = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBuildFile {
    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated build file. Only obtainable through `TryFrom<RawBuildFile>`
/// (or [`BuildFile::new_unchecked`] from code that validated by other
/// means).
#[derive(Debug, Clone)]
pub struct BuildFile {
    task: BTreeMap<String, TaskConfig>,
}

impl BuildFile {
    pub fn new_unchecked(task: BTreeMap<String, TaskConfig>) -> Self {
        Self { task }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }

    pub fn into_tasks(self) -> BTreeMap<String, TaskConfig> {
        self.task
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Tasks to invoke before this one's own work.
    #[serde(default)]
    pub after: Vec<String>,

    /// Invoke `after` concurrently instead of in order.
    #[serde(default)]
    pub parallel: bool,

    /// Globs selecting this task's source files. When empty, the task's
    /// files are the merged results of `after`.
    #[serde(default)]
    pub find: Vec<String>,

    /// Directory searched by `find`; `@` prefixes are relative to the build
    /// file.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Globs excluded from `find`.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Shell command run over the task's files, from the build file's
    /// directory.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Append the absolute path of every file to `cmd`.
    #[serde(default)]
    pub pass_files: bool,

    /// Run `cmd` on a worker thread.
    #[serde(default)]
    pub worker: bool,
}

fn default_directory() -> String {
    "@".to_string()
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            after: Vec::new(),
            parallel: false,
            find: Vec::new(),
            directory: default_directory(),
            ignore: Vec::new(),
            cmd: None,
            pass_files: false,
            worker: false,
        }
    }
}
