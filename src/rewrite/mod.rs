//! Relative `url()` rewriting.
//!
//! For every declaration of every rule, the first `url(...)` token is
//! classified. Local relative references are copied into the dump directory
//! as `<stylesheet stem>_dumped_<asset name>` and the token is replaced by
//! `url("<prefix>/<that name>")`. Everything else passes through untouched.
//!
//! # Phases
//!
//! [`Transform::apply`] works in three steps so a stylesheet is never
//! reported as done while its assets are still in flight:
//!
//! 1. plan: classify declarations in source order, nothing is mutated
//! 2. copy: run all copy jobs in parallel and wait for every one
//! 3. commit: write new values according to [`MissingAssetPolicy`]
//!
//! # Example
//!
//! ```ignore
//! let transform = configure(RewriteOptions::new("/static/images", "dist/static/images"));
//! let mut sheet = Stylesheet::read(Path::new("vendor/style.css"))?;
//! let report = transform.apply(&mut sheet);
//! std::fs::write("dist/style.css", sheet.to_css())?;
//! ```

mod asset;
mod error;
mod report;
mod url;

pub use asset::{CopyJob, CopyResults, DUMP_INFIX, OutputAsset, run_copies};
pub use error::{MissingField, RewriteError};
pub use report::{SkipCounts, Status, TransformReport};
pub use url::{UrlClass, UrlReference, classify};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::stylesheet::{Declaration, StyleTree};
use crate::{debug, log};

/// What to do when an asset cannot be copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAssetPolicy {
    /// Log it and still rewrite the reference (it will dangle).
    #[default]
    Warn,
    /// Leave the whole stylesheet unmodified.
    Error,
}

/// Settings for one transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Prefix of rewritten urls, e.g. `/static/images`.
    pub url_prefix: Option<String>,
    /// Directory receiving copied assets. Must already exist.
    pub dump_dir: Option<PathBuf>,
    pub missing_asset: MissingAssetPolicy,
}

impl RewriteOptions {
    pub fn new(url_prefix: impl Into<String>, dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            url_prefix: Some(url_prefix.into()),
            dump_dir: Some(dump_dir.into()),
            missing_asset: MissingAssetPolicy::default(),
        }
    }

    pub fn with_missing_asset(mut self, policy: MissingAssetPolicy) -> Self {
        self.missing_asset = policy;
        self
    }
}

/// Why a `url()` reference was left alone.
#[derive(Debug)]
pub enum SkipReason {
    DataUri,
    Absolute,
    ExternalProtocol,
    Malformed(RewriteError),
}

/// A qualifying reference: new declaration value plus the copy behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub value: String,
    pub job: CopyJob,
}

/// Result of classifying one declaration.
#[derive(Debug)]
pub enum Outcome {
    /// No `url(` in the value.
    Untouched,
    Skip(SkipReason),
    Rewrite(Rewrite),
}

/// Create the stylesheet transform.
pub fn configure(options: RewriteOptions) -> Transform {
    Transform::new(options)
}

/// Stateless url rewriter, applied once per stylesheet.
#[derive(Debug, Clone)]
pub struct Transform {
    options: RewriteOptions,
}

/// Validated settings borrowed from the options.
struct Settings<'a> {
    prefix: &'a str,
    dump_dir: &'a Path,
}

impl Transform {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    fn settings(&self, stylesheet: &Path) -> Result<Settings<'_>, RewriteError> {
        let missing = |field| RewriteError::ConfigurationMissing {
            field,
            stylesheet: stylesheet.to_path_buf(),
        };
        let dump_dir = self
            .options
            .dump_dir
            .as_deref()
            .ok_or_else(|| missing(MissingField::DumpDir))?;
        let prefix = self
            .options
            .url_prefix
            .as_deref()
            .ok_or_else(|| missing(MissingField::UrlPrefix))?;
        Ok(Settings { prefix, dump_dir })
    }

    /// Classify one declaration from `source_file`.
    ///
    /// Fails only when required configuration is missing.
    pub fn process_declaration(
        &self,
        source_file: &Path,
        decl: &Declaration,
    ) -> Result<Outcome, RewriteError> {
        let settings = self.settings(source_file)?;
        Ok(classify_declaration(&settings, source_file, decl))
    }

    /// Rewrite every qualifying declaration of `sheet`.
    ///
    /// Never fails: problems are logged and collected into the report.
    pub fn apply<T: StyleTree + ?Sized>(&self, sheet: &mut T) -> TransformReport {
        let source_file = sheet.source_file().to_path_buf();
        let mut report = TransformReport::new(&source_file);

        let settings = match self.settings(&source_file) {
            Ok(settings) => settings,
            Err(e) => {
                log!("warning"; "{}", e);
                report.status = Status::Skipped(e);
                return report;
            }
        };

        // Plan
        let mut planned: Vec<Option<String>> = Vec::new();
        let mut jobs = Vec::new();
        sheet.walk_decls(&mut |decl: &mut Declaration| {
            let next = match classify_declaration(&settings, &source_file, decl) {
                Outcome::Untouched => None,
                Outcome::Skip(reason) => {
                    count_skip(&mut report.skipped, &reason);
                    None
                }
                Outcome::Rewrite(rewrite) => {
                    jobs.push(rewrite.job);
                    Some(rewrite.value)
                }
            };
            planned.push(next);
        });

        if jobs.is_empty() {
            return report;
        }

        // Copy
        let results = run_copies(&jobs);
        report.copied = results.copied;
        report.failures = results.failures;

        if !report.failures.is_empty() {
            match self.options.missing_asset {
                MissingAssetPolicy::Error => {
                    for failure in &report.failures {
                        log!("error"; "{}: {}", failure, io_reason(failure));
                    }
                    log!("error"; "leaving `{}` unmodified", source_file.display());
                    report.status = Status::Rejected;
                    return report;
                }
                MissingAssetPolicy::Warn => {
                    for failure in &report.failures {
                        log!("warning"; "{}: {} (referenced from `{}`)",
                            failure, io_reason(failure), source_file.display());
                    }
                }
            }
        }

        // Commit
        let mut index = 0;
        let mut rewritten = 0;
        sheet.walk_decls(&mut |decl: &mut Declaration| {
            if let Some(Some(value)) = planned.get_mut(index).map(Option::take) {
                decl.value = value;
                rewritten += 1;
            }
            index += 1;
        });
        report.rewritten = rewritten;

        debug!("rewrite"; "{}: {} rewritten, {} skipped",
            source_file.display(), report.rewritten, report.skipped.total());
        report
    }
}

fn classify_declaration(settings: &Settings<'_>, source_file: &Path, decl: &Declaration) -> Outcome {
    let reference = match UrlReference::extract(&decl.value) {
        Ok(Some(reference)) => reference,
        Ok(None) => return Outcome::Untouched,
        Err(e) => {
            debug!("skip"; "{}", e);
            return Outcome::Skip(SkipReason::Malformed(e));
        }
    };

    let reason = match reference.class() {
        UrlClass::DataUri => SkipReason::DataUri,
        UrlClass::Absolute => SkipReason::Absolute,
        UrlClass::ExternalProtocol => SkipReason::ExternalProtocol,
        UrlClass::LocalRelative => {
            let asset = OutputAsset::derive(source_file, &reference.raw);
            let value = format!(
                "{}url(\"{}/{}\"){}",
                &decl.value[..reference.token.start],
                settings.prefix,
                asset.output_file_name,
                &decl.value[reference.token.end..]
            );
            debug!("rewrite"; "{} -> {}", reference.raw, value);
            return Outcome::Rewrite(Rewrite {
                value,
                job: CopyJob::new(&asset, settings.dump_dir),
            });
        }
    };

    debug!("skip"; "{:?} url: {}", reason, reference.raw);
    Outcome::Skip(reason)
}

fn count_skip(counts: &mut SkipCounts, reason: &SkipReason) {
    match reason {
        SkipReason::DataUri => counts.data_uri += 1,
        SkipReason::Absolute => counts.absolute += 1,
        SkipReason::ExternalProtocol => counts.external += 1,
        SkipReason::Malformed(_) => counts.malformed += 1,
    }
}

/// Underlying io message of a copy failure, for log lines.
fn io_reason(err: &RewriteError) -> String {
    match err {
        RewriteError::AssetCopy { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stylesheet::Stylesheet;
    use std::fs;
    use tempfile::TempDir;

    const PREFIX: &str = "/static/images";

    /// Site layout with `css/style.css`, assets next to it and an empty dump dir.
    struct Site {
        dir: TempDir,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path();
            fs::create_dir_all(root.join("css/images")).unwrap();
            fs::create_dir_all(root.join("dump")).unwrap();
            fs::write(root.join("css/cog.png"), b"cog-bytes").unwrap();
            fs::write(root.join("css/images/center_icon.png"), b"icon-bytes").unwrap();
            fs::write(root.join("example.svg"), b"<svg/>").unwrap();
            Self { dir }
        }

        fn sheet_path(&self) -> PathBuf {
            self.dir.path().join("css/style.css")
        }

        fn dump(&self) -> PathBuf {
            self.dir.path().join("dump")
        }

        fn sheet(&self, css: &str) -> Stylesheet {
            Stylesheet::parse(self.sheet_path(), css)
        }

        fn transform(&self) -> Transform {
            configure(RewriteOptions::new(PREFIX, self.dump()))
        }

        fn dumped(&self) -> Vec<String> {
            let mut names: Vec<_> = fs::read_dir(self.dump())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[test]
    fn test_relative_url_rewrite() {
        let site = Site::new();
        let mut sheet = site.sheet(".two { background-image: url(\"cog.png\"); }");

        let report = site.transform().apply(&mut sheet);

        assert_eq!(
            sheet.to_css(),
            ".two { background-image: url(\"/static/images/style_dumped_cog.png\"); }"
        );
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.copied, 1);
        assert_eq!(
            fs::read(site.dump().join("style_dumped_cog.png")).unwrap(),
            b"cog-bytes"
        );
    }

    #[test]
    fn test_absolute_url_passes_through() {
        let site = Site::new();
        let css = ".four { background-image: url(\"/ignored_asset.png\"); }";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert_eq!(report.skipped.absolute, 1);
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_external_url_passes_through() {
        let site = Site::new();
        let css = ".x { background: url(http://example.com/x.png) }";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert_eq!(report.skipped.external, 1);
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_data_uri_passes_through() {
        let site = Site::new();
        let css = ".three { background-image: url(data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw); }";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert_eq!(report.skipped.data_uri, 1);
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_mixed_declarations() {
        let site = Site::new();
        let css = "\
.one { background-image: url(\"images/center_icon.png\"); }
.two { background-image: url(\"/abs.png\"); }
.three { background-image: url(data:image/gif;base64,R0lGODlh); }
.four { background-image: url(https://cdn.example.com/a.png); }
.five { background-image: url('../example.svg'); color: red; }
";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        let expected = "\
.one { background-image: url(\"/static/images/style_dumped_center_icon.png\"); }
.two { background-image: url(\"/abs.png\"); }
.three { background-image: url(data:image/gif;base64,R0lGODlh); }
.four { background-image: url(https://cdn.example.com/a.png); }
.five { background-image: url(\"/static/images/style_dumped_example.svg\"); color: red; }
";
        assert_eq!(sheet.to_css(), expected);
        assert_eq!(report.rewritten, 2);
        assert_eq!(
            report.skipped,
            SkipCounts {
                data_uri: 1,
                absolute: 1,
                external: 1,
                malformed: 0,
            }
        );
        assert_eq!(
            site.dumped(),
            ["style_dumped_center_icon.png", "style_dumped_example.svg"]
        );
    }

    #[test]
    fn test_rest_of_value_is_preserved() {
        let site = Site::new();
        let mut sheet = site.sheet(".a { background: #fff url(cog.png) no-repeat top left }");

        site.transform().apply(&mut sheet);

        assert_eq!(
            sheet.to_css(),
            ".a { background: #fff url(\"/static/images/style_dumped_cog.png\") no-repeat top left }"
        );
    }

    #[test]
    fn test_only_first_url_is_processed() {
        let site = Site::new();
        let mut sheet = site.sheet(".a { background: url(cog.png), url(images/center_icon.png) }");

        site.transform().apply(&mut sheet);

        assert_eq!(
            sheet.to_css(),
            ".a { background: url(\"/static/images/style_dumped_cog.png\"), url(images/center_icon.png) }"
        );
        assert_eq!(site.dumped(), ["style_dumped_cog.png"]);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let site = Site::new();
        let css = ".two { background-image: url(\"cog.png\"); }";

        let mut first = site.sheet(css);
        site.transform().apply(&mut first);
        let mut second = site.sheet(css);
        site.transform().apply(&mut second);

        assert_eq!(first.to_css(), second.to_css());
        assert_eq!(site.dumped(), ["style_dumped_cog.png"]);

        // Feeding the output back in changes nothing: the url is now absolute.
        let mut again = site.sheet(&first.to_css());
        let report = site.transform().apply(&mut again);
        assert!(report.is_unchanged());
        assert_eq!(again.to_css(), first.to_css());
    }

    #[test]
    fn test_missing_dump_dir_aborts() {
        let site = Site::new();
        let css = ".two { background-image: url(\"cog.png\"); }";
        let mut sheet = site.sheet(css);
        let transform = configure(RewriteOptions {
            url_prefix: Some(PREFIX.into()),
            dump_dir: None,
            ..RewriteOptions::default()
        });

        let report = transform.apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert!(report.is_skipped());
        assert!(matches!(
            report.status,
            Status::Skipped(RewriteError::ConfigurationMissing {
                field: MissingField::DumpDir,
                ..
            })
        ));
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_missing_prefix_aborts() {
        let site = Site::new();
        let css = ".two { background-image: url(\"cog.png\"); }";
        let mut sheet = site.sheet(css);
        let transform = configure(RewriteOptions {
            url_prefix: None,
            dump_dir: Some(site.dump()),
            ..RewriteOptions::default()
        });

        let report = transform.apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        match report.status {
            Status::Skipped(RewriteError::ConfigurationMissing { field, stylesheet }) => {
                assert_eq!(field, MissingField::UrlPrefix);
                assert_eq!(stylesheet, site.sheet_path());
            }
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_missing_asset_warn_still_rewrites() {
        let site = Site::new();
        let mut sheet = site.sheet(".a { background: url(missing.png) } .b { background: url(cog.png) }");

        let report = site.transform().apply(&mut sheet);

        assert_eq!(
            sheet.to_css(),
            ".a { background: url(\"/static/images/style_dumped_missing.png\") } \
             .b { background: url(\"/static/images/style_dumped_cog.png\") }"
        );
        assert!(!report.is_failed());
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.copied, 1);
        assert!(matches!(
            report.failures.as_slice(),
            [RewriteError::AssetCopy { .. }]
        ));
        assert_eq!(site.dumped(), ["style_dumped_cog.png"]);
    }

    #[test]
    fn test_missing_asset_error_leaves_sheet_unmodified() {
        let site = Site::new();
        let css = ".a { background: url(missing.png) } .b { background: url(cog.png) }";
        let mut sheet = site.sheet(css);
        let transform = configure(
            RewriteOptions::new(PREFIX, site.dump()).with_missing_asset(MissingAssetPolicy::Error),
        );

        let report = transform.apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert!(report.is_failed());
        assert_eq!(report.rewritten, 0);
        assert_eq!(report.failures.len(), 1);
        // Successful copies are not rolled back.
        assert_eq!(site.dumped(), ["style_dumped_cog.png"]);
    }

    #[test]
    fn test_malformed_token_is_skipped() {
        let site = Site::new();
        let css = ".a { background: url() } .b { background: url( ) } .c { background: url(cog.png";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        assert_eq!(sheet.to_css(), css);
        assert_eq!(report.skipped.malformed, 3);
        assert!(site.dumped().is_empty());
    }

    #[test]
    fn test_at_rule_nested_in_rule_is_rewritten() {
        let site = Site::new();
        let mut sheet =
            site.sheet(".a { @media (min-width: 1px) { background: url(cog.png) } }");

        let report = site.transform().apply(&mut sheet);

        assert_eq!(
            sheet.to_css(),
            ".a { @media (min-width: 1px) { background: url(\"/static/images/style_dumped_cog.png\") } }"
        );
        assert_eq!(report.rewritten, 1);
        assert_eq!(site.dumped(), ["style_dumped_cog.png"]);
    }

    #[test]
    fn test_paren_in_url_truncates() {
        let site = Site::new();
        let css = ".a { background: url(\"img(1).png\") }";
        let mut sheet = site.sheet(css);

        let report = site.transform().apply(&mut sheet);

        // Capture is `"img(1` which has no extension, so nothing happens.
        assert_eq!(sheet.to_css(), css);
        assert_eq!(report.skipped.data_uri, 1);
    }

    #[test]
    fn test_process_declaration() {
        let site = Site::new();
        let transform = site.transform();
        let decl = Declaration::new("background", "url(images/center_icon.png)");

        let outcome = transform
            .process_declaration(&site.sheet_path(), &decl)
            .unwrap();

        match outcome {
            Outcome::Rewrite(rewrite) => {
                assert_eq!(
                    rewrite.value,
                    "url(\"/static/images/style_dumped_center_icon.png\")"
                );
                assert_eq!(rewrite.job.from, site.dir.path().join("css/images/center_icon.png"));
                assert_eq!(rewrite.job.to, site.dump().join("style_dumped_center_icon.png"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let plain = Declaration::new("color", "red");
        assert!(matches!(
            transform.process_declaration(&site.sheet_path(), &plain),
            Ok(Outcome::Untouched)
        ));
    }
}
