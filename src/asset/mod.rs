//! Output-side asset helpers.

pub mod minify;

pub use minify::{maybe_minify, minify_css};
