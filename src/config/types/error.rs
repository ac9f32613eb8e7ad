//! Configuration errors and directory diagnostics.
//!
//! Validation only inspects the two directories the run touches: the dump
//! directory receiving copied assets and the output directory receiving
//! rewritten stylesheets. Each problem found becomes a [`ConfigDiagnostic`].
//! A missing dump directory is reported but does not stop the run.

use owo_colors::{OwoColorize, Stream, Style};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    // No #[from]: the diagnostics already print every problem in Display.
    #[error("{0}")]
    Invalid(ConfigDiagnostics),
}

/// Directory setting a diagnostic points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSetting {
    DumpDir,
    OutDir,
}

impl DirSetting {
    /// Key in `twist.toml`.
    pub fn key(self) -> &'static str {
        match self {
            Self::DumpDir => "rewrite.dump_dir",
            Self::OutDir => "output.dir",
        }
    }

    /// Equivalent command-line flag.
    pub fn flag(self) -> &'static str {
        match self {
            Self::DumpDir => "--dump-dir",
            Self::OutDir => "--out-dir",
        }
    }
}

/// What is wrong with a configured directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirProblem {
    /// Does not exist. Assets copied into it will fail.
    Missing,
    /// Exists but is a file.
    NotADirectory,
    /// Already holds input stylesheets, which would be overwritten.
    HoldsInputs,
}

/// One problem with one configured directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiagnostic {
    pub setting: DirSetting,
    pub path: PathBuf,
    pub problem: DirProblem,
}

impl ConfigDiagnostic {
    pub fn new(setting: DirSetting, path: &Path, problem: DirProblem) -> Self {
        Self {
            setting,
            path: path.to_path_buf(),
            problem,
        }
    }

    /// Only a missing dump directory lets the run go on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.problem, DirProblem::Missing)
    }

    pub fn message(&self) -> String {
        let path = self.path.display();
        match self.problem {
            DirProblem::Missing => format!("`{path}` does not exist, asset copies will fail"),
            DirProblem::NotADirectory => format!("`{path}` is not a directory"),
            DirProblem::HoldsInputs => {
                format!("`{path}` contains input stylesheets, they would be overwritten")
            }
        }
    }

    pub fn hint(&self) -> String {
        match self.problem {
            DirProblem::Missing => format!("create `{}` before running", self.path.display()),
            DirProblem::NotADirectory => format!(
                "point {} (or {}) at a directory",
                self.setting.key(),
                self.setting.flag()
            ),
            DirProblem::HoldsInputs => "write rewritten stylesheets to a separate directory".into(),
        }
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.setting.key();
        let key = key.if_supports_color(Stream::Stderr, |k| k.style(Style::new().cyan()));
        write!(f, "[{key}] {}", self.message())?;
        let hint = "hint:".if_supports_color(Stream::Stderr, |h| h.style(Style::new().yellow()));
        write!(f, "\n  {hint} {}", self.hint())
    }
}

/// Problems collected by one validation pass.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    found: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, setting: DirSetting, path: &Path, problem: DirProblem) {
        self.found.push(ConfigDiagnostic::new(setting, path, problem));
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.found.iter().filter(|d| d.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.found.iter().filter(|d| !d.is_fatal())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Log non-fatal problems through the `warning` prefix.
    pub fn log_warnings(&self) {
        for diag in self.warnings() {
            crate::log!("warning"; "[{}] {}", diag.setting.key(), diag.message());
        }
    }

    /// Log warnings, then fail if any problem is fatal.
    pub fn finish(self) -> Result<(), ConfigError> {
        self.log_warnings();
        if self.has_errors() {
            Err(ConfigError::Invalid(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors().count();
        let title = format!("config rejected ({count} problem(s)):");
        let title = title.if_supports_color(Stream::Stderr, |t| t.style(Style::new().red().bold()));
        write!(f, "{title}")?;
        for diag in self.errors() {
            write!(f, "\n\n{diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
