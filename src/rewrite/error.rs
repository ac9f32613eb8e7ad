//! Rewrite error types.
//!
//! None of these ever escape [`Transform::apply`](super::Transform::apply):
//! they are logged and collected into the report.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which required setting is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    UrlPrefix,
    DumpDir,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlPrefix => f.write_str("url prefix"),
            Self::DumpDir => f.write_str("dump directory"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("no {field} configured, skipping `{}`", .stylesheet.display())]
    ConfigurationMissing {
        field: MissingField,
        stylesheet: PathBuf,
    },

    #[error("failed to copy `{}` to `{}`", .from.display(), .to.display())]
    AssetCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed url() token in `{value}`")]
    MalformedUrl { value: String },
}
