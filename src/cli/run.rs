//! Process stylesheets one after another.
//!
//! read → rewrite urls (assets copied) → optional minify → write

use std::collections::HashSet;
use std::fs;
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::asset::maybe_minify;
use crate::config::TwistConfig;
use crate::rewrite::{Transform, TransformReport, configure};
use crate::stylesheet::Stylesheet;
use crate::utils::path::collect_stylesheets;
use crate::{debug, log};

/// Totals across all processed stylesheets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stylesheets: usize,
    pub rewritten: usize,
    pub copied: usize,
    pub copy_failures: usize,
    /// Stylesheets left untouched because configuration was missing.
    pub skipped: usize,
    /// Stylesheets rejected under the strict missing-asset policy.
    pub rejected: Vec<PathBuf>,
}

impl RunSummary {
    fn add(&mut self, report: &TransformReport) {
        self.stylesheets += 1;
        self.rewritten += report.rewritten;
        self.copied += report.copied;
        self.copy_failures += report.failures.len();
        if report.is_skipped() {
            self.skipped += 1;
        }
        if report.is_failed() {
            self.rejected.push(report.source_file.clone());
        }
    }

    fn log(&self) {
        log!(
            "done";
            "{} stylesheet(s), {} url(s) rewritten, {} asset(s) copied, {} copy failure(s)",
            self.stylesheets, self.rewritten, self.copied, self.copy_failures
        );
        if self.skipped > 0 {
            log!("warning"; "{} stylesheet(s) skipped: missing prefix or dump directory", self.skipped);
        }
    }
}

/// Run the transform over every stylesheet named by `paths`.
///
/// Fails if no stylesheet is found, if one cannot be read or written, or if
/// any stylesheet was rejected under the strict policy.
pub fn run(paths: &[PathBuf], config: &TwistConfig) -> Result<RunSummary> {
    let sheets = collect_stylesheets(paths);
    if sheets.is_empty() {
        bail!("no stylesheets found");
    }
    config.validate(&sheets)?;

    let transform = configure(config.rewrite_options());
    let mut summary = RunSummary::default();
    let mut written = HashSet::new();

    for path in &sheets {
        let report = process_one(path, &transform, config, &mut written)?;
        summary.add(&report);
    }

    summary.log();

    if !summary.rejected.is_empty() {
        for path in &summary.rejected {
            log!("error"; "rejected `{}`", path.display());
        }
        bail!(
            "{} stylesheet(s) left unmodified because assets failed to copy",
            summary.rejected.len()
        );
    }

    Ok(summary)
}

fn process_one(
    path: &Path,
    transform: &Transform,
    config: &TwistConfig,
    written: &mut HashSet<PathBuf>,
) -> Result<TransformReport> {
    let mut sheet = Stylesheet::read(path)?;
    let report = transform.apply(&mut sheet);

    if report.rewritten > 0 {
        log!("rewrite"; "{}: {} url(s)", path.display(), report.rewritten);
    } else {
        debug!("rewrite"; "{}: unchanged", path.display());
    }

    let css = maybe_minify(sheet.to_css(), config.output.minify);
    write_output(path, &css, config.output.dir.as_deref(), written)?;
    Ok(report)
}

/// Write to `out_dir/<file name>`, or to stdout when no directory is set.
fn write_output(
    source: &Path,
    css: &str,
    out_dir: Option<&Path>,
    written: &mut HashSet<PathBuf>,
) -> Result<()> {
    let Some(out_dir) = out_dir else {
        let mut stdout = stdout().lock();
        stdout.write_all(css.as_bytes())?;
        if !css.ends_with('\n') {
            writeln!(stdout)?;
        }
        return Ok(());
    };

    let file_name = source
        .file_name()
        .with_context(|| format!("`{}` has no file name", source.display()))?;
    let target = out_dir.join(file_name);

    if !written.insert(target.clone()) {
        log!("warning"; "`{}` written more than once, last one wins", target.display());
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create `{}`", out_dir.display()))?;
    fs::write(&target, css).with_context(|| format!("failed to write `{}`", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSection, RewriteSection};
    use crate::rewrite::MissingAssetPolicy;
    use tempfile::TempDir;

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path();
            fs::create_dir_all(root.join("src/vendor")).unwrap();
            fs::create_dir_all(root.join("dump")).unwrap();
            fs::write(root.join("src/vendor/cog.png"), b"cog").unwrap();
            fs::write(
                root.join("src/vendor/style.css"),
                ".two { background-image: url(\"cog.png\"); }\n",
            )
            .unwrap();
            fs::write(
                root.join("src/plain.css"),
                ".a { background: url(/abs.png) }\n",
            )
            .unwrap();
            Self { dir }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        fn config(&self, missing: MissingAssetPolicy) -> TwistConfig {
            TwistConfig {
                rewrite: RewriteSection {
                    prefix: Some("/static/images".into()),
                    dump_dir: Some(self.path("dump")),
                    missing,
                },
                output: OutputSection {
                    dir: Some(self.path("out")),
                    minify: false,
                },
                ..TwistConfig::default()
            }
        }
    }

    #[test]
    fn test_run_directory() {
        let project = Project::new();
        let config = project.config(MissingAssetPolicy::Warn);

        let summary = run(&[project.path("src")], &config).unwrap();

        assert_eq!(summary.stylesheets, 2);
        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.copied, 1);
        assert_eq!(
            fs::read_to_string(project.path("out/style.css")).unwrap(),
            ".two { background-image: url(\"/static/images/style_dumped_cog.png\"); }\n"
        );
        assert_eq!(
            fs::read_to_string(project.path("out/plain.css")).unwrap(),
            ".a { background: url(/abs.png) }\n"
        );
        assert_eq!(
            fs::read(project.path("dump/style_dumped_cog.png")).unwrap(),
            b"cog"
        );
    }

    #[test]
    fn test_run_strict_rejects() {
        let project = Project::new();
        fs::write(
            project.path("src/broken.css"),
            ".x { background: url(missing.png) }\n",
        )
        .unwrap();
        let config = project.config(MissingAssetPolicy::Error);

        let err = run(&[project.path("src/broken.css")], &config).unwrap_err();
        assert!(err.to_string().contains("left unmodified"));
        assert_eq!(
            fs::read_to_string(project.path("out/broken.css")).unwrap(),
            ".x { background: url(missing.png) }\n"
        );
    }

    #[test]
    fn test_run_without_dump_dir_passes_through() {
        let project = Project::new();
        let mut config = project.config(MissingAssetPolicy::Warn);
        config.rewrite.dump_dir = None;

        let summary = run(&[project.path("src/vendor/style.css")], &config).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rewritten, 0);
        assert_eq!(
            fs::read_to_string(project.path("out/style.css")).unwrap(),
            ".two { background-image: url(\"cog.png\"); }\n"
        );
        assert!(fs::read_dir(project.path("dump")).unwrap().next().is_none());
    }

    #[test]
    fn test_run_no_stylesheets() {
        let project = Project::new();
        let empty = project.path("empty");
        fs::create_dir_all(&empty).unwrap();
        let config = project.config(MissingAssetPolicy::Warn);
        assert!(run(&[empty], &config).is_err());
    }
}
