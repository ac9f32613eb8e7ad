//! Configuration management for `twist.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── types/         # ConfigError, ConfigDiagnostics
//! ├── util.rs        # config discovery, path expansion
//! └── mod.rs         # TwistConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[rewrite]`  | url prefix, dump directory, missing-asset policy |
//! | `[output]`   | where rewritten stylesheets go, minification     |
//!
//! Paths in the file are relative to the file's directory. Paths given on
//! the command line are relative to the current directory and override the
//! file.

pub mod types;
mod util;

pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, DirProblem, DirSetting};
pub use util::{expand_path, find_config_file};

use crate::cli::Cli;
use crate::log;
use crate::rewrite::{MissingAssetPolicy, RewriteOptions};
use crate::utils::path::normalize_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "twist.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing twist.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwistConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative file paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Url rewriting settings
    #[serde(default)]
    pub rewrite: RewriteSection,

    /// Output settings
    #[serde(default)]
    pub output: OutputSection,
}

/// `[rewrite]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteSection {
    /// Prefix of rewritten urls, e.g. `/static/images`.
    pub prefix: Option<String>,
    /// Directory receiving copied assets.
    pub dump_dir: Option<PathBuf>,
    /// `warn` (default) or `error`.
    pub missing: MissingAssetPolicy,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Directory for rewritten stylesheets. Stdout when unset.
    pub dir: Option<PathBuf>,
    /// Minify rewritten stylesheets with lightningcss.
    pub minify: bool,
}

impl TwistConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// A missing default config file is fine; a missing `--config` file is not.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => Some(normalize_path(&cwd.join(path))),
            None => find_config_file(&cwd, Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);

        config.config_path = config_path;
        config.finalize(&root, &cwd, cli);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve file paths and apply CLI overrides.
    fn finalize(&mut self, root: &Path, cwd: &Path, cli: &Cli) {
        self.root = root.to_path_buf();

        // File paths are relative to the config file
        if let Some(dir) = self.rewrite.dump_dir.take() {
            self.rewrite.dump_dir = Some(expand_path(&dir, root));
        }
        if let Some(dir) = self.output.dir.take() {
            self.output.dir = Some(expand_path(&dir, root));
        }

        self.apply_cli(cli, cwd);
    }

    /// Apply command-line overrides. CLI paths are relative to `cwd`.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        crate::logger::set_verbose(cli.verbose);

        if let Some(prefix) = &cli.prefix {
            self.rewrite.prefix = Some(prefix.clone());
        }
        if let Some(dir) = &cli.dump_dir {
            self.rewrite.dump_dir = Some(expand_path(dir, cwd));
        }
        if let Some(dir) = &cli.out_dir {
            self.output.dir = Some(expand_path(dir, cwd));
        }
        if cli.strict {
            self.rewrite.missing = MissingAssetPolicy::Error;
        }
        Self::update_option(&mut self.output.minify, cli.minify.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Options handed to the rewriter.
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            url_prefix: self.rewrite.prefix.clone(),
            dump_dir: self.rewrite.dump_dir.clone(),
            missing_asset: self.rewrite.missing,
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration against the stylesheets about to be processed.
    ///
    /// Collects all validation errors and returns them at once. A missing
    /// prefix or dump directory is not an error here: the rewriter reports
    /// it per stylesheet and leaves those stylesheets untouched.
    pub fn validate(&self, stylesheets: &[PathBuf]) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if let Some(dump_dir) = &self.rewrite.dump_dir {
            if !dump_dir.exists() {
                diag.report(DirSetting::DumpDir, dump_dir, DirProblem::Missing);
            } else if !dump_dir.is_dir() {
                diag.report(DirSetting::DumpDir, dump_dir, DirProblem::NotADirectory);
            }
        }

        if let Some(out_dir) = &self.output.dir {
            if out_dir.exists() && !out_dir.is_dir() {
                diag.report(DirSetting::OutDir, out_dir, DirProblem::NotADirectory);
            }

            let out_dir = normalize_path(out_dir);
            let clobbers_source = stylesheets.iter().any(|sheet| {
                normalize_path(sheet).parent() == Some(out_dir.as_path())
            });
            if clobbers_source {
                diag.report(DirSetting::OutDir, &out_dir, DirProblem::HoldsInputs);
            }
        }

        Ok(diag.finish()?)
    }
}

// ============================================================================
// tests
// ============================================================================
