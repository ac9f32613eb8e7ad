//! Stylesheet traversal.
//!
//! The rewriter does not care how a stylesheet was parsed. It only needs an
//! ordered walk over declarations plus the path of the file they came from,
//! which is what [`StyleTree`] provides.
//!
//! [`Stylesheet`] is the built-in, source-preserving implementation: it keeps
//! the original text and only splices back values that were changed, so every
//! untouched byte of the input survives [`Stylesheet::to_css`] as-is.

mod scan;

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::utils::path::normalize_path;

pub use scan::{RawDecl, scan_declarations};

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Ordered, mutable access to the declarations of one stylesheet.
pub trait StyleTree {
    /// Path of the stylesheet file the declarations came from.
    fn source_file(&self) -> &Path;

    /// Visit every declaration of every rule, in source order.
    fn walk_decls(&mut self, f: &mut dyn FnMut(&mut Declaration));
}

/// Source text plus the declarations found in it.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    source_file: PathBuf,
    text: String,
    decls: Vec<Located>,
}

#[derive(Debug, Clone)]
struct Located {
    span: Range<usize>,
    decl: Declaration,
}

impl Stylesheet {
    /// Build a stylesheet from already-loaded text.
    pub fn parse(source_file: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let decls = scan_declarations(&text)
            .into_iter()
            .map(|raw| Located {
                decl: Declaration::new(raw.property, &text[raw.value.clone()]),
                span: raw.value,
            })
            .collect();

        Self {
            source_file: source_file.into(),
            text,
            decls,
        }
    }

    /// Read a stylesheet from disk. The stored source path is absolute.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read stylesheet `{}`", path.display()))?;
        Ok(Self::parse(normalize_path(path), text))
    }

    /// Declarations in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().map(|l| &l.decl)
    }

    /// Original, unmodified source text.
    pub fn source_text(&self) -> &str {
        &self.text
    }

    /// Serialize back to CSS, splicing in changed values only.
    pub fn to_css(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for located in &self.decls {
            let original = &self.text[located.span.clone()];
            if original == located.decl.value {
                continue;
            }
            out.push_str(&self.text[cursor..located.span.start]);
            out.push_str(&located.decl.value);
            cursor = located.span.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

impl StyleTree for Stylesheet {
    fn source_file(&self) -> &Path {
        &self.source_file
    }

    fn walk_decls(&mut self, f: &mut dyn FnMut(&mut Declaration)) {
        for located in &mut self.decls {
            f(&mut located.decl);
        }
    }
}
