use crate::{UrlError, UrlResult};
use url::Url;

/// Schemes that never point at anything the mirror can fetch
const SKIPPED_SCHEMES: &[&str] = &["data:", "javascript:", "mailto:", "tel:"];

/// Parses an absolute HTTP(S) URL such as a seed or a batch entry
///
/// # Errors
///
/// * `UrlError::Parse` - the string is not a URL
/// * `UrlError::InvalidScheme` - the scheme is not `http` or `https`
/// * `UrlError::MissingHost` - the URL has no host
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// Resolves a reference found in content against the document's URL
///
/// Returns None if the reference should be skipped:
/// - empty or fragment-only references
/// - `data:`, `javascript:`, `mailto:`, `tel:` schemes
/// - references that fail to parse
/// - non-HTTP(S) URLs after resolution
///
/// The fragment, if any, is preserved on the returned URL.
///
/// # Examples
///
/// ```
/// use site_mirror::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("http://ex.com/docs/index.html").unwrap();
/// let url = resolve_reference("../img/a.png", &base).unwrap();
/// assert_eq!(url.as_str(), "http://ex.com/img/a.png");
/// assert!(resolve_reference("mailto:me@ex.com", &base).is_none());
/// ```
pub fn resolve_reference(reference: &str, base_url: &Url) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let lowered = reference.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(reference) {
        Ok(resolved) if resolved.scheme() == "http" || resolved.scheme() == "https" => {
            Some(resolved)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::trace!("Skipping unparseable reference '{}': {}", reference, e);
            None
        }
    }
}
