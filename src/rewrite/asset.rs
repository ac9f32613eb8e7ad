//! Output naming and asset copying.
//!
//! ```text
//! /site/vendor/css/style.css        url("images/cog.png")
//!   output_file_name      style_dumped_cog.png
//!   resolved_source_path  /site/vendor/css/images/cog.png
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::error::RewriteError;
use super::url::EXTENSION;
use crate::log;
use crate::utils::path::resolve_lexically;

/// Separator between the stylesheet stem and the asset name.
pub const DUMP_INFIX: &str = "_dumped_";

/// Where a local asset comes from and what it is called in the dump directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    pub output_file_name: String,
    pub resolved_source_path: PathBuf,
}

impl OutputAsset {
    /// Derive the output asset for `raw` referenced from `source_file`.
    ///
    /// Pure: the same inputs always give the same name and path.
    pub fn derive(source_file: &Path, raw: &str) -> Self {
        let sheet_name = source_file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let stripped = EXTENSION.replace(&sheet_name, "");

        let output_file_name = format!("{stripped}{DUMP_INFIX}{}", basename(raw));

        let input_dir = source_file.parent().unwrap_or(Path::new(""));
        let resolved_source_path = resolve_lexically(&input_dir.join(raw));

        Self {
            output_file_name,
            resolved_source_path,
        }
    }
}

/// Last `/`-separated segment, ignoring trailing slashes.
fn basename(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// One file copy into the dump directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl CopyJob {
    pub fn new(asset: &OutputAsset, dump_dir: &Path) -> Self {
        Self {
            from: asset.resolved_source_path.clone(),
            to: dump_dir.join(&asset.output_file_name),
        }
    }

    /// Raw byte copy, overwriting any existing file.
    pub fn run(&self) -> Result<u64, RewriteError> {
        fs::copy(&self.from, &self.to).map_err(|source| RewriteError::AssetCopy {
            from: self.from.clone(),
            to: self.to.clone(),
            source,
        })
    }
}

/// Outcome of running a stylesheet's copy jobs.
#[derive(Debug, Default)]
pub struct CopyResults {
    pub copied: usize,
    pub failures: Vec<RewriteError>,
}

/// Run every job to completion, in parallel, before returning.
///
/// Jobs with the same destination run once: the first one in source order
/// wins, so a given stylesheet always produces the same dump directory.
pub fn run_copies(jobs: &[CopyJob]) -> CopyResults {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(jobs.len());
    for job in jobs {
        if seen.insert(&job.to) {
            unique.push(job);
        } else if unique.iter().any(|u| u.to == job.to && u.from != job.from) {
            log!(
                "warning";
                "`{}` and another asset both map to `{}`, keeping the first",
                job.from.display(),
                job.to.display()
            );
        }
    }

    let results: Vec<_> = unique.par_iter().map(|job| job.run()).collect();

    let mut out = CopyResults::default();
    for result in results {
        match result {
            Ok(_) => out.copied += 1,
            Err(e) => out.failures.push(e),
        }
    }
    out
}
