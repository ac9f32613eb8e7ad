//! `url(...)` extraction and classification.
//!
//! Extraction is pattern based: the first `url(` followed by one or more
//! non-`)` characters and a `)`. A `)` inside the url itself (unusual paths,
//! some data URIs) therefore truncates the capture. That is a known
//! limitation of this approach and is covered by tests.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::error::RewriteError;

/// A final `.` followed by 1 to 5 alphanumerics at the end of the string.
pub(crate) static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[0-9A-Za-z]{1,5}$").unwrap());

static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"url\(([^)]+)\)").unwrap());

/// What a url points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    /// No recognizable file extension: data URIs, fragments, bare names.
    DataUri,
    /// Starts with `/`.
    Absolute,
    /// Contains `://` (http, https, ftp, ...).
    ExternalProtocol,
    /// A file next to (or below, or above) the stylesheet.
    LocalRelative,
}

/// The first `url(...)` token of a declaration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReference {
    /// Text inside the parentheses with quotes removed and whitespace trimmed.
    pub raw: String,
    /// Byte range of the whole `url(...)` token in the value.
    pub token: Range<usize>,
}

impl UrlReference {
    /// Extract the first url token from `value`.
    ///
    /// Returns `Ok(None)` if the value has no `url(` at all.
    pub fn extract(value: &str) -> Result<Option<Self>, RewriteError> {
        if !value.contains("url(") {
            return Ok(None);
        }

        let malformed = || RewriteError::MalformedUrl {
            value: value.to_string(),
        };

        let caps = URL_TOKEN.captures(value).ok_or_else(malformed)?;
        let (Some(token), Some(inner)) = (caps.get(0), caps.get(1)) else {
            return Err(malformed());
        };

        let raw: String = inner
            .as_str()
            .chars()
            .filter(|c| !matches!(c, '"' | '\''))
            .collect();
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(malformed());
        }

        Ok(Some(Self {
            raw: raw.to_string(),
            token: token.range(),
        }))
    }

    pub fn class(&self) -> UrlClass {
        classify(&self.raw)
    }
}

/// Classify a url path. The extension check comes first.
pub fn classify(raw: &str) -> UrlClass {
    if !EXTENSION.is_match(raw) {
        UrlClass::DataUri
    } else if raw.starts_with('/') {
        UrlClass::Absolute
    } else if raw.contains("://") {
        UrlClass::ExternalProtocol
    } else {
        UrlClass::LocalRelative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: &str) -> String {
        UrlReference::extract(value).unwrap().unwrap().raw
    }

    #[test]
    fn test_no_url() {
        assert_eq!(UrlReference::extract("red").unwrap(), None);
        assert_eq!(UrlReference::extract("URL(a.png)").unwrap(), None);
    }

    #[test]
    fn test_quotes_are_stripped() {
        assert_eq!(raw("url(\"cog.png\")"), "cog.png");
        assert_eq!(raw("url('cog.png')"), "cog.png");
        assert_eq!(raw("url(cog.png)"), "cog.png");
        assert_eq!(raw("url( \"cog.png\" )"), "cog.png");
    }

    #[test]
    fn test_padding_does_not_change_class() {
        let padded = UrlReference::extract("url( cog.png )").unwrap().unwrap();
        assert_eq!(padded.class(), UrlClass::LocalRelative);
        let absolute = UrlReference::extract("url( /a.png)").unwrap().unwrap();
        assert_eq!(absolute.class(), UrlClass::Absolute);
    }

    #[test]
    fn test_token_range_covers_whole_token() {
        let value = "no-repeat url('a/b.png') center";
        let url = UrlReference::extract(value).unwrap().unwrap();
        assert_eq!(&value[url.token], "url('a/b.png')");
    }

    #[test]
    fn test_first_token_only() {
        assert_eq!(raw("url(a.png), url(b.png)"), "a.png");
    }

    #[test]
    fn test_paren_truncates_capture() {
        // Known limitation: the capture stops at the first `)`.
        assert_eq!(raw("url(img(1).png)"), "img(1");
        assert_eq!(classify("img(1"), UrlClass::DataUri);
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            UrlReference::extract("url(a.png"),
            Err(RewriteError::MalformedUrl { .. })
        ));
        assert!(matches!(
            UrlReference::extract("url()"),
            Err(RewriteError::MalformedUrl { .. })
        ));
        assert!(matches!(
            UrlReference::extract("url(\"\")"),
            Err(RewriteError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("data:image/gif;base64,R0lGODlh"), UrlClass::DataUri);
        assert_eq!(classify("#gradient"), UrlClass::DataUri);
        assert_eq!(classify("font.woff?v=1"), UrlClass::DataUri);
        assert_eq!(classify("/ignored_asset.png"), UrlClass::Absolute);
        assert_eq!(classify("http://example.com/x.png"), UrlClass::ExternalProtocol);
        assert_eq!(classify("images/center_icon.PNG"), UrlClass::LocalRelative);
        assert_eq!(classify("../example.svg"), UrlClass::LocalRelative);
        assert_eq!(classify("font.woff2"), UrlClass::LocalRelative);
        assert_eq!(classify("archive.toolong"), UrlClass::DataUri);
    }
}
