//! Stylesheet minification.
//!
//! Uses lightningcss. Only applied to the serialized output, after every
//! url has been rewritten.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

/// Minify CSS source code.
///
/// Returns `None` if lightningcss cannot parse or print the stylesheet.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify when asked to, falling back to the input on failure.
pub fn maybe_minify(source: String, minify: bool) -> String {
    if !minify {
        return source;
    }
    match minify_css(&source) {
        Some(minified) => minified,
        None => {
            crate::log!("warning"; "could not minify stylesheet, writing it as-is");
            source
        }
    }
}
