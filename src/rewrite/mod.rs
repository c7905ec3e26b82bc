//! Link conversion over a finished mirror
//!
//! After the crawl, every saved page and stylesheet is re-scanned with the
//! same extractor used during the crawl. Each reference that resolves to the
//! mirrored host is replaced, in place, by the path of its local copy
//! relative to the directory of the file being rewritten. Targets are
//! computed with [`local_path`], the same function the fetcher saved with, so
//! a converted reference always points where the file actually is.
//!
//! Only the matched reference text is replaced, never other occurrences of
//! the same string, so a URL that is a prefix of another cannot corrupt it.
//! Converting already-converted content is a no-op: relative references
//! resolve back to the same URLs and map to the same relative paths.
//!
//! Content is handled as raw bytes. Pages in legacy encodings are converted
//! like any other, and every byte outside a replaced reference is kept.

use crate::crawler::scan_content;
use crate::state::DownloadedFile;
use crate::url::{is_same_host, local_path, relative_reference, resolve_reference, ResourceKind};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use url::Url;

/// Counts from one conversion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files whose content changed
    pub converted: usize,

    /// Parseable files that needed no change
    pub unchanged: usize,

    /// Files that could not be read or written
    pub failed: usize,
}

/// Rewrites same-host references in `content` relative to `file_path`
///
/// `file_url` is the URL the content was fetched from and serves as the base
/// for resolving its references. Returns `None` when nothing changes.
/// The content need not be valid UTF-8.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use url::Url;
/// use site_mirror::rewrite::rewrite_content;
/// use site_mirror::ResourceKind;
///
/// let out = Path::new("ex.com");
/// let page = Url::parse("http://ex.com/docs/").unwrap();
/// let html = r#"<a href="http://ex.com/p.html">P</a>"#;
///
/// let converted = rewrite_content(
///     html,
///     ResourceKind::Page,
///     &page,
///     &out.join("docs").join("index.html"),
///     "ex.com",
///     out,
/// );
/// assert_eq!(converted.as_deref(), Some(&br#"<a href="../p.html">P</a>"#[..]));
/// ```
pub fn rewrite_content(
    content: impl AsRef<[u8]>,
    kind: ResourceKind,
    file_url: &Url,
    file_path: &Path,
    base_host: &str,
    output_dir: &Path,
) -> Option<Vec<u8>> {
    let content = content.as_ref();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut covered_until = 0;

    for resource in scan_content(content, kind, file_url) {
        // Several patterns can report the same reference
        if resource.span.start < covered_until {
            continue;
        }

        if !is_same_host(&resource.url, base_host) {
            continue;
        }

        let target = local_path(&resource.url, output_dir);
        let Some(mut relative) = relative_reference(file_path, &target) else {
            tracing::debug!(
                "No relative path from {} to {}",
                file_path.display(),
                target.display()
            );
            continue;
        };

        let fragment = resolve_reference(&resource.original, file_url)
            .and_then(|url| url.fragment().map(str::to_string));
        if let Some(fragment) = fragment {
            relative.push('#');
            relative.push_str(&fragment);
        }

        covered_until = resource.span.end;
        if relative.as_bytes() != &content[resource.span.clone()] {
            edits.push((resource.span, relative));
        }
    }

    if edits.is_empty() {
        return None;
    }

    let mut rewritten = Vec::with_capacity(content.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        rewritten.extend_from_slice(&content[cursor..span.start]);
        rewritten.extend_from_slice(replacement.as_bytes());
        cursor = span.end;
    }
    rewritten.extend_from_slice(&content[cursor..]);

    Some(rewritten)
}

/// Converts one saved file in place
///
/// Returns whether the file was modified.
pub fn rewrite_file(
    file_url: &Url,
    file: &DownloadedFile,
    base_host: &str,
    output_dir: &Path,
) -> std::io::Result<bool> {
    let content = std::fs::read(&file.local_path)?;

    let Some(rewritten) = rewrite_content(
        &content,
        file.kind,
        file_url,
        &file.local_path,
        base_host,
        output_dir,
    ) else {
        return Ok(false);
    };

    std::fs::write(&file.local_path, rewritten)?;
    Ok(true)
}

/// Runs the conversion pass over every saved page and stylesheet
///
/// Per-file failures are logged and leave that file unconverted; they never
/// abort the pass.
pub fn convert_links(
    downloaded: &BTreeMap<String, DownloadedFile>,
    base_host: &str,
    output_dir: &Path,
) -> RewriteReport {
    let mut report = RewriteReport::default();

    for (url, file) in downloaded {
        if !file.kind.is_parseable() {
            continue;
        }

        let file_url = match Url::parse(url) {
            Ok(file_url) => file_url,
            Err(e) => {
                tracing::warn!("Skipping link conversion for {}: {}", url, e);
                report.failed += 1;
                continue;
            }
        };

        match rewrite_file(&file_url, file, base_host, output_dir) {
            Ok(true) => {
                tracing::debug!("Converted links in {}", file.local_path.display());
                report.converted += 1;
            }
            Ok(false) => report.unchanged += 1,
            Err(e) => {
                tracing::warn!(
                    "Failed to convert links in {}: {}",
                    file.local_path.display(),
                    e
                );
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        "Link conversion: {} converted, {} unchanged, {} failed",
        report.converted,
        report.unchanged,
        report.failed
    );

    report
}
