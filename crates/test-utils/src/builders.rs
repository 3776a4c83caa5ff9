#![allow(dead_code)]

use std::collections::BTreeMap;

use pipework::config::{BuildFile, RawBuildFile, TaskConfig};

/// Builder for `BuildFile` to simplify test setup.
pub struct BuildFileBuilder {
    raw: RawBuildFile,
}

impl BuildFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawBuildFile {
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(name.to_string(), task);
        self
    }

    pub fn raw(self) -> RawBuildFile {
        self.raw
    }

    pub fn build(self) -> BuildFile {
        BuildFile::try_from(self.raw).expect("Failed to build valid build file from builder")
    }
}

impl Default for BuildFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn parallel(mut self) -> Self {
        self.task.parallel = true;
        self
    }

    pub fn find(mut self, pattern: &str) -> Self {
        self.task.find.push(pattern.to_string());
        self
    }

    pub fn directory(mut self, dir: &str) -> Self {
        self.task.directory = dir.to_string();
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.task.ignore.push(pattern.to_string());
        self
    }

    pub fn pass_files(mut self) -> Self {
        self.task.pass_files = true;
        self
    }

    pub fn worker(mut self) -> Self {
        self.task.worker = true;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
