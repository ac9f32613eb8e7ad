//! Per-stylesheet transform summary.

use std::path::{Path, PathBuf};

use super::error::RewriteError;

/// How the transform ended for one stylesheet.
#[derive(Debug, Default)]
pub enum Status {
    /// Every qualifying declaration was processed.
    #[default]
    Complete,
    /// Required configuration is missing; nothing was touched.
    Skipped(RewriteError),
    /// Strict policy: an asset failed to copy, so no value was rewritten.
    Rejected,
}

/// Number of `url()` references left alone, by reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipCounts {
    pub data_uri: usize,
    pub absolute: usize,
    pub external: usize,
    pub malformed: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.data_uri + self.absolute + self.external + self.malformed
    }
}

#[derive(Debug)]
pub struct TransformReport {
    pub source_file: PathBuf,
    pub status: Status,
    /// Declarations whose value was rewritten.
    pub rewritten: usize,
    /// Assets successfully copied into the dump directory.
    pub copied: usize,
    pub skipped: SkipCounts,
    /// Copy failures, in source order.
    pub failures: Vec<RewriteError>,
}

impl TransformReport {
    pub fn new(source_file: &Path) -> Self {
        Self {
            source_file: source_file.to_path_buf(),
            status: Status::Complete,
            rewritten: 0,
            copied: 0,
            skipped: SkipCounts::default(),
            failures: Vec::new(),
        }
    }

    /// No declaration value was changed.
    pub fn is_unchanged(&self) -> bool {
        self.rewritten == 0
    }

    /// The stylesheet was rejected under the strict missing-asset policy.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, Status::Rejected)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, Status::Skipped(_))
    }
}
