//! Twist - rewrite relative `url()` references in stylesheets.
//!
//! Local assets referenced by a stylesheet are copied into one dump
//! directory as `<stylesheet stem>_dumped_<asset name>`, and the reference
//! becomes `url("<prefix>/<that name>")`. Absolute urls, external urls and
//! data URIs are left alone.
//!
//! The transform works on anything implementing [`stylesheet::StyleTree`];
//! [`stylesheet::Stylesheet`] is a source-preserving implementation.

pub mod asset;
pub mod cli;
pub mod config;
pub mod logger;
pub mod rewrite;
pub mod stylesheet;
pub mod utils;

pub use rewrite::{
    MissingAssetPolicy, RewriteOptions, Transform, TransformReport, configure,
};
pub use stylesheet::{Declaration, StyleTree, Stylesheet};
