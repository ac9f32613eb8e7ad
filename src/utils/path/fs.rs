//! Filesystem path helpers.
//!
//! - `normalize_path` - absolute form of an existing (or not) path
//! - `resolve_lexically` - absolute form without touching the filesystem
//! - `collect_stylesheets` - expand files/directories into `.css` files

use std::path::{Component, Path, PathBuf};

use jwalk::WalkDir;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to [`resolve_lexically`] when the path does not exist.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| resolve_lexically(path))
}

/// Resolve `path` to an absolute path by processing `.` and `..` components.
///
/// Relative paths are anchored at the current directory. Symlinks are not
/// followed and the path does not have to exist. `..` at the root stays at
/// the root.
///
/// # Example
/// ```ignore
/// resolve_lexically(Path::new("/opt/site/css/../img/a.png")) // "/opt/site/img/a.png"
/// ```
pub fn resolve_lexically(path: &Path) -> PathBuf {
    let anchored = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut out = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // ".." above the root is dropped.
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Expand the given files and directories into a sorted list of stylesheets.
///
/// Files are taken as-is whatever their extension. Directories are walked
/// recursively for `*.css`.
pub fn collect_stylesheets(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .sort(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "css"))
                .collect();
            found.sort();
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    out
}
