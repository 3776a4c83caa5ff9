// src/config/validate.rs

use globset::Glob;

use crate::config::model::{BuildFile, RawBuildFile, TaskConfig};
use crate::errors::{PipeworkError, Result};

impl TryFrom<RawBuildFile> for BuildFile {
    type Error = PipeworkError;

    fn try_from(raw: RawBuildFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_build_file(&raw)?;
        Ok(BuildFile::new_unchecked(raw.task))
    }
}

/// Check a parsed build file without consuming it.
///
/// Cycles between tasks are not rejected here: they are legal to declare
/// and only fail, with the full chain, when actually invoked.
pub fn validate_raw_build_file(cfg: &RawBuildFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task_name(name)?;
        validate_task_dependencies(cfg, name, task)?;
        validate_globs(name, task)?;
        validate_command(name, task)?;
    }
    Ok(())
}

fn ensure_has_tasks(cfg: &RawBuildFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipeworkError::ConfigError(
            "build file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PipeworkError::ConfigError(
            "task names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawBuildFile, name: &str, task: &TaskConfig) -> Result<()> {
    for dep in task.after.iter() {
        if dep == name {
            return Err(PipeworkError::ConfigError(format!(
                "task '{name}' cannot depend on itself in `after`"
            )));
        }
        if !cfg.task.contains_key(dep) {
            return Err(PipeworkError::ConfigError(format!(
                "task '{name}' has unknown dependency '{dep}' in `after`"
            )));
        }
    }
    Ok(())
}

fn validate_globs(name: &str, task: &TaskConfig) -> Result<()> {
    for pattern in task.find.iter().chain(task.ignore.iter()) {
        Glob::new(pattern).map_err(|e| {
            PipeworkError::ConfigError(format!("task '{name}' has invalid glob '{pattern}': {e}"))
        })?;
    }
    if task.find.is_empty() && !task.ignore.is_empty() {
        return Err(PipeworkError::ConfigError(format!(
            "task '{name}' sets `ignore` without `find`"
        )));
    }
    Ok(())
}

fn validate_command(name: &str, task: &TaskConfig) -> Result<()> {
    match task.cmd.as_deref() {
        Some(cmd) if cmd.trim().is_empty() => Err(PipeworkError::ConfigError(format!(
            "task '{name}' has an empty `cmd`"
        ))),
        None if task.worker || task.pass_files => Err(PipeworkError::ConfigError(format!(
            "task '{name}' sets `worker` or `pass_files` without `cmd`"
        ))),
        _ => Ok(()),
    }
}
