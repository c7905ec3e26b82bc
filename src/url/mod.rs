//! URL handling module for Site-Mirror
//!
//! This module provides the primitives every other component builds on:
//! reference resolution, resource classification, same-host checks, and the
//! URL to local-path mapping shared by the fetcher and the link rewriter.

mod domain;
mod local_path;
mod resolve;

use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{host_key, is_same_host};
pub use local_path::{local_path, local_path_for, relative_reference, INDEX_FILE};
pub use resolve::{parse_http_url, resolve_reference};

/// The kind of a discovered or fetched resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// HTML markup
    Page,
    /// CSS stylesheet
    Stylesheet,
    /// JavaScript source
    Script,
    /// Raster or vector image
    Image,
    /// Anything else (fonts, archives, documents, ...)
    Other,
}

impl ResourceKind {
    /// Returns true if content of this kind is scanned for further references
    pub fn is_parseable(&self) -> bool {
        matches!(self, Self::Page | Self::Stylesheet)
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Stylesheet => "stylesheet",
            Self::Script => "script",
            Self::Image => "image",
            Self::Other => "other",
        }
    }

    /// Infers a kind from a declared `Content-Type` header value
    ///
    /// Returns `None` when the media type says nothing useful, so callers can
    /// fall back to [`classify_url`].
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "text/html" | "application/xhtml+xml" => Some(Self::Page),
            "text/css" => Some(Self::Stylesheet),
            t if t.contains("javascript") || t.contains("ecmascript") => Some(Self::Script),
            t if t.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a URL by the extension of its last path segment
///
/// `.css` is a stylesheet, `.js`/`.mjs` a script, common image extensions are
/// images, `.html`/`.htm` or no extension at all is a page, and anything else
/// is `Other`. Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use site_mirror::url::classify_url;
/// use site_mirror::ResourceKind;
/// use url::Url;
///
/// let url = Url::parse("http://ex.com/img/Logo.PNG").unwrap();
/// assert_eq!(classify_url(&url), ResourceKind::Image);
///
/// let url = Url::parse("http://ex.com/docs/").unwrap();
/// assert_eq!(classify_url(&url), ResourceKind::Page);
/// ```
pub fn classify_url(url: &Url) -> ResourceKind {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let Some((_, extension)) = last_segment.rsplit_once('.') else {
        return ResourceKind::Page;
    };

    match extension.to_ascii_lowercase().as_str() {
        "css" => ResourceKind::Stylesheet,
        "js" | "mjs" => ResourceKind::Script,
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "bmp" | "avif" => {
            ResourceKind::Image
        }
        "html" | "htm" => ResourceKind::Page,
        _ => ResourceKind::Other,
    }
}
