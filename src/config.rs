//! Locating the task lists.
//!
//! todo.sh keeps its settings in a shell script (`~/.todo.cfg` by default), so
//! values are read by sourcing that script in `sh` and printing the variable.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{ChecklistError, Result};

/// Default todo.sh config file.
pub const DEFAULT_CONFIG: &str = "~/.todo.cfg";

/// Where the active and archived task lists live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    pub todo_dir: PathBuf,
    pub todo_file: PathBuf,
    pub done_file: PathBuf,
}

impl TodoConfig {
    /// `todo.txt` and `done.txt` inside `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        TodoConfig {
            todo_dir: dir.to_path_buf(),
            todo_file: dir.join("todo.txt"),
            done_file: dir.join("done.txt"),
        }
    }

    /// Use `todo_dir` when given, otherwise read `TODO_DIR`, `TODO_FILE` and
    /// `DONE_FILE` from the config script.
    pub fn resolve(config_file: &Path, todo_dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = todo_dir {
            return Ok(Self::from_dir(&expand_home(dir)));
        }

        let config_file = expand_home(config_file);
        if !config_file.is_file() {
            return Err(ChecklistError::Config(format!(
                "config file {} not found (use --todo-dir to bypass it)",
                config_file.display()
            )));
        }

        let dir = read_shell_var(&config_file, "TODO_DIR")?.ok_or_else(|| {
            ChecklistError::Config(format!("TODO_DIR is not set in {}", config_file.display()))
        })?;
        let mut config = Self::from_dir(&expand_home(Path::new(&dir)));
        if let Some(file) = read_shell_var(&config_file, "TODO_FILE")? {
            config.todo_file = config.todo_dir.join(expand_home(Path::new(&file)));
        }
        if let Some(file) = read_shell_var(&config_file, "DONE_FILE")? {
            config.done_file = config.todo_dir.join(expand_home(Path::new(&file)));
        }
        debug!(?config, "resolved todo configuration");
        Ok(config)
    }

    /// Resolve a file name against the task directory. Absolute paths pass through.
    pub fn path_for(&self, file: &Path) -> PathBuf {
        self.todo_dir.join(expand_home(file))
    }
}

/// Replace a leading `~` with `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        Err(_) => path.to_path_buf(),
    }
}

/// Source `config_file` in `sh` and return the value of `key`, or `None` when
/// it is unset or empty.
pub fn read_shell_var(config_file: &Path, key: &str) -> Result<Option<String>> {
    let valid_key = key.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_key {
        return Err(ChecklistError::Config(format!("'{key}' is not a shell variable name")));
    }

    // `.` searches $PATH for bare names, so always hand it a path with a slash.
    let script = if config_file.is_absolute() {
        config_file.to_path_buf()
    } else {
        Path::new(".").join(config_file)
    };
    let output = Command::new("sh")
        .arg("-c")
        .arg(r#". "$1" >/dev/null 2>&1; eval "printf '%s' \"\${$2-}\"""#)
        .arg("sh")
        .arg(&script)
        .arg(key)
        .output()
        .map_err(|source| ChecklistError::Io { path: script.clone(), source })?;
    if !output.status.success() {
        return Err(ChecklistError::Config(format!(
            "sourcing {} failed: {}",
            script.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if value.is_empty() { None } else { Some(value) })
}
