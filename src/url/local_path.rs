use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Characters escaped when a local path is written back into markup or CSS
const REFERENCE_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// File name substituted for directory-like URL paths
pub const INDEX_FILE: &str = "index.html";

/// Maps a URL to the local file it is mirrored at
///
/// The leading `/` of the URL path is stripped; an empty path or a path ending
/// in `/` gets `index.html` appended; the remaining segments are
/// percent-decoded and joined onto `output_dir` with the platform separator,
/// so `/my%20file.html` is saved as `my file.html`. Query and fragment never take
/// part, so the function is pure in `(url path, output_dir)`. Empty, `.` and
/// `..` segments are dropped so nothing can land outside `output_dir`.
///
/// This is the single mapping consulted both when a resource is saved and when
/// the link rewriter works out where a referenced URL lives.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use url::Url;
/// use site_mirror::url::local_path;
///
/// let out = Path::new("mirror");
/// let url = Url::parse("http://ex.com/a/").unwrap();
/// assert_eq!(local_path(&url, out), out.join("a").join("index.html"));
///
/// let url = Url::parse("http://ex.com/a/b.css").unwrap();
/// assert_eq!(local_path(&url, out), out.join("a").join("b.css"));
/// ```
pub fn local_path(url: &Url, output_dir: &Path) -> PathBuf {
    let raw_path = url.path();
    let trimmed = raw_path.strip_prefix('/').unwrap_or(raw_path);

    let mut path = output_dir.to_path_buf();
    for segment in trimmed.split('/').filter_map(decode_segment) {
        path.push(segment);
    }

    if trimmed.is_empty() || trimmed.ends_with('/') {
        path.push(INDEX_FILE);
    }

    path
}

/// Percent-decodes one path segment; None for segments that must be dropped
///
/// A segment that decodes to a separator or NUL keeps its encoded form so it
/// cannot split into several path components.
fn decode_segment(segment: &str) -> Option<String> {
    if matches!(segment, "" | "." | "..") {
        return None;
    }

    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    match decoded.as_ref() {
        "" | "." | ".." => None,
        text if text.contains(|c: char| matches!(c, '/' | '\\' | '\0')) => {
            Some(segment.to_string())
        }
        text => Some(text.to_string()),
    }
}

/// String form of [`local_path`]; None if `url` does not parse
pub fn local_path_for(url: &str, output_dir: &Path) -> Option<PathBuf> {
    Url::parse(url).ok().map(|url| local_path(&url, output_dir))
}

/// Computes the reference to `target` relative to the directory of `from_file`
///
/// The result always uses `/` separators so it can be written into markup
/// regardless of platform, and each component is percent-encoded so that a
/// browser decoding the reference lands on the file [`local_path`] produced.
/// None if no relative path exists (for example a different drive prefix on
/// Windows).
pub fn relative_reference(from_file: &Path, target: &Path) -> Option<String> {
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(target, from_dir)?;

    let parts: Vec<String> = relative
        .components()
        .map(|component| match component {
            Component::ParentDir => "..".to_string(),
            Component::CurDir => ".".to_string(),
            other => {
                let name = other.as_os_str().to_string_lossy();
                utf8_percent_encode(&name, REFERENCE_ESCAPES).to_string()
            }
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(url: &str) -> PathBuf {
        local_path_for(url, Path::new("out")).unwrap()
    }

    #[test]
    fn test_root_becomes_index() {
        assert_eq!(path_of("http://ex.com"), Path::new("out/index.html"));
        assert_eq!(path_of("http://ex.com/"), Path::new("out/index.html"));
    }

    #[test]
    fn test_trailing_slash_becomes_index() {
        assert_eq!(path_of("http://ex.com/a/"), Path::new("out/a/index.html"));
        assert_eq!(path_of("http://ex.com/a/b/"), Path::new("out/a/b/index.html"));
    }

    #[test]
    fn test_file_path_is_mirrored() {
        assert_eq!(path_of("http://ex.com/a/b.css"), Path::new("out/a/b.css"));
        assert_eq!(path_of("http://ex.com/img/a.png"), Path::new("out/img/a.png"));
        assert_eq!(path_of("http://ex.com/about"), Path::new("out/about"));
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(path_of("http://ex.com/p.html?x=1#top"), Path::new("out/p.html"));
    }

    #[test]
    fn test_empty_segments_collapse() {
        assert_eq!(path_of("http://ex.com//a///b.css"), Path::new("out/a/b.css"));
    }

    #[test]
    fn test_encoded_dot_segments_stay_inside_output() {
        let path = path_of("http://ex.com/%2e%2e/secret");
        assert!(path.starts_with("out"));
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        assert_eq!(
            path_of("http://ex.com/docs/my file.html"),
            Path::new("out/docs/my file.html")
        );
        assert_eq!(
            path_of("http://ex.com/docs/my%20file.html"),
            Path::new("out/docs/my file.html")
        );
        assert_eq!(
            path_of("http://ex.com/caf%C3%A9/menu.html"),
            Path::new("out/café/menu.html")
        );
        assert_eq!(path_of("http://ex.com/café.html"), Path::new("out/café.html"));
    }

    #[test]
    fn test_encoded_separator_stays_one_segment() {
        assert_eq!(path_of("http://ex.com/a%2Fb.html"), Path::new("out/a%2Fb.html"));
        assert_eq!(path_of("http://ex.com/%2Fetc/passwd"), Path::new("out/%2Fetc/passwd"));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let out = Path::new("/tmp/mirror");
        let url = Url::parse("http://ex.com/a/").unwrap();
        assert_eq!(local_path(&url, out), local_path(&url, out));
        assert_eq!(local_path(&url, out), out.join("a/index.html"));
    }

    #[test]
    fn test_relative_same_directory() {
        let from = Path::new("out/index.html");
        let to = Path::new("out/p.html");
        assert_eq!(relative_reference(from, to), Some("p.html".to_string()));
    }

    #[test]
    fn test_relative_into_subdirectory() {
        let from = Path::new("out/s.css");
        let to = Path::new("out/img/a.png");
        assert_eq!(relative_reference(from, to), Some("img/a.png".to_string()));
    }

    #[test]
    fn test_relative_to_parent() {
        let from = Path::new("out/docs/guide.html");
        let to = Path::new("out/index.html");
        assert_eq!(relative_reference(from, to), Some("../index.html".to_string()));
    }

    #[test]
    fn test_relative_to_sibling_directory() {
        let from = Path::new("out/docs/index.html");
        let to = Path::new("out/img/a.png");
        assert_eq!(relative_reference(from, to), Some("../img/a.png".to_string()));
    }

    #[test]
    fn test_relative_reference_is_percent_encoded() {
        let from = Path::new("out/index.html");
        assert_eq!(
            relative_reference(from, Path::new("out/docs/my file.html")),
            Some("docs/my%20file.html".to_string())
        );
        assert_eq!(
            relative_reference(from, Path::new("out/café/menu.html")),
            Some("caf%C3%A9/menu.html".to_string())
        );
    }

    #[test]
    fn test_saved_path_and_reference_agree() {
        // The reference written into a page must lead back to the saved file
        let out = Path::new("out");
        let page = Url::parse("http://ex.com/").unwrap();
        for raw in ["http://ex.com/docs/my file.html", "http://ex.com/café/menu.html"] {
            let target = local_path(&Url::parse(raw).unwrap(), out);
            let reference = relative_reference(&out.join("index.html"), &target).unwrap();
            let resolved = page.join(&reference).unwrap();
            assert_eq!(local_path(&resolved, out), target);
        }
    }

    #[test]
    fn test_relative_to_self() {
        let from = Path::new("out/a/index.html");
        assert_eq!(relative_reference(from, from), Some("index.html".to_string()));
    }
}
