//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization and stylesheet discovery

pub mod fs;

pub use fs::{collect_stylesheets, normalize_path, resolve_lexically};
