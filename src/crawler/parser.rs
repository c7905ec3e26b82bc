//! Resource extraction from markup and stylesheets
//!
//! This module scans page and stylesheet text for references to other
//! resources and resolves them against the document URL:
//! - `href="..."` and `src="..."` attributes in markup
//! - `<link rel="stylesheet" href="...">` and `<script src="...">`
//! - `@import "..."` and `url(...)` in stylesheets
//!
//! Scanning works on raw bytes, so documents in legacy encodings (Latin-1,
//! Windows-1252, ...) are scanned as they are and spans index the original
//! bytes.
//!
//! This is a lightweight pattern scanner, not a conformant HTML/CSS parser.
//! Attributes split across lines inside a quoted value, unquoted attribute
//! values, and anything generated by scripts are not seen.

use crate::url::{classify_url, parse_http_url, resolve_reference, ResourceKind};
use crate::UrlResult;
use regex::bytes::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use url::Url;

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)href\s*=\s*["']([^"']+)["']"#).expect("valid href pattern")
});

static SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)src\s*=\s*["']([^"']+)["']"#).expect("valid src pattern")
});

static STYLESHEET_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<link[^>]*rel\s*=\s*["']stylesheet["'][^>]*href\s*=\s*["']([^"']+)["']"#)
        .expect("valid stylesheet link pattern")
});

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<script[^>]*src\s*=\s*["']([^"']+)["']"#).expect("valid script pattern")
});

static IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<img[^>]*src\s*=\s*["']([^"']+)["']"#).expect("valid img pattern")
});

static CSS_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)@import\s+["']([^"']+)["']"#).expect("valid import pattern")
});

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)url\s*\(\s*["']?([^"')]+)["']?\s*\)"#).expect("valid url() pattern")
});

/// A single reference discovered in markup or a stylesheet
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Absolute URL with any fragment removed
    pub url: Url,

    /// Inferred kind of the referenced resource
    pub kind: ResourceKind,

    /// The reference as written in the document (invalid UTF-8 replaced)
    pub original: String,

    /// Byte range of the reference within the scanned content
    pub span: Range<usize>,
}

/// Extracts resources from page markup
///
/// Duplicates are kept: the same reference may be reported by several
/// patterns, and the same URL may appear many times. Output is in document
/// order.
///
/// # Errors
///
/// Only a structurally invalid `base_url` fails. Individual references that
/// do not resolve are skipped silently.
///
/// # Example
///
/// ```
/// use site_mirror::crawler::extract_from_markup;
/// use site_mirror::ResourceKind;
///
/// let html = r#"<a href="/p.html">P</a><link rel="stylesheet" href="/s.css">"#;
/// let resources = extract_from_markup(html, "http://ex.com/").unwrap();
/// assert_eq!(resources[0].url.as_str(), "http://ex.com/p.html");
/// assert!(resources.iter().any(|r| r.kind == ResourceKind::Stylesheet));
/// ```
pub fn extract_from_markup(content: &str, base_url: &str) -> UrlResult<Vec<Resource>> {
    let base = parse_http_url(base_url)?;
    Ok(scan_markup(content, &base))
}

/// Extracts resources from stylesheet text (`@import` and `url(...)`)
///
/// # Errors
///
/// Only a structurally invalid `base_url` fails.
pub fn extract_from_stylesheet(content: &str, base_url: &str) -> UrlResult<Vec<Resource>> {
    let base = parse_http_url(base_url)?;
    Ok(scan_stylesheet(content, &base))
}

/// Scans markup against an already parsed document URL
pub fn scan_markup(content: impl AsRef<[u8]>, base_url: &Url) -> Vec<Resource> {
    let content = content.as_ref();
    let mut resources = Vec::new();

    collect(&HREF_RE, None, content, base_url, &mut resources);
    collect(&SRC_RE, None, content, base_url, &mut resources);
    collect(
        &STYLESHEET_LINK_RE,
        Some(ResourceKind::Stylesheet),
        content,
        base_url,
        &mut resources,
    );
    collect(
        &SCRIPT_RE,
        Some(ResourceKind::Script),
        content,
        base_url,
        &mut resources,
    );
    collect(
        &IMG_RE,
        Some(ResourceKind::Image),
        content,
        base_url,
        &mut resources,
    );

    // Stable: for a shared span the generic match comes first
    resources.sort_by_key(|resource| resource.span.start);
    resources
}

/// Scans stylesheet text against an already parsed stylesheet URL
pub fn scan_stylesheet(content: impl AsRef<[u8]>, base_url: &Url) -> Vec<Resource> {
    let content = content.as_ref();
    let mut resources = Vec::new();

    collect(
        &CSS_IMPORT_RE,
        Some(ResourceKind::Stylesheet),
        content,
        base_url,
        &mut resources,
    );
    collect(&CSS_URL_RE, None, content, base_url, &mut resources);

    resources.sort_by_key(|resource| resource.span.start);
    resources
}

/// Scans content of the given kind; non-parseable kinds yield nothing
pub fn scan_content(
    content: impl AsRef<[u8]>,
    kind: ResourceKind,
    base_url: &Url,
) -> Vec<Resource> {
    match kind {
        ResourceKind::Page => scan_markup(content, base_url),
        ResourceKind::Stylesheet => scan_stylesheet(content, base_url),
        _ => Vec::new(),
    }
}

/// Runs one pattern over the content, resolving capture group 1 of each match
///
/// With `forced_kind` the pattern itself determines the kind; otherwise the
/// resolved URL is classified by extension.
fn collect(
    pattern: &Regex,
    forced_kind: Option<ResourceKind>,
    content: &[u8],
    base_url: &Url,
    out: &mut Vec<Resource>,
) {
    for captures in pattern.captures_iter(content) {
        let Some(reference) = captures.get(1) else {
            continue;
        };

        let original = String::from_utf8_lossy(reference.as_bytes()).into_owned();
        let Some(mut url) = resolve_reference(&original, base_url) else {
            continue;
        };
        url.set_fragment(None);

        let kind = forced_kind.unwrap_or_else(|| classify_url(&url));
        out.push(Resource {
            url,
            kind,
            original,
            span: reference.range(),
        });
    }
}
