use url::{Position, Url};

/// Extracts the network host component of a URL, including a non-default port
///
/// Two URLs are on the same host for mirroring purposes when their host keys
/// are equal. The host is lowercased by the URL parser already; a port is only
/// present when it differs from the scheme's default.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_mirror::url::host_key;
///
/// let url = Url::parse("http://EX.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("ex.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    url.host_str()?;
    Some(url[Position::BeforeHost..Position::AfterPort].to_string())
}

/// Returns true if `url` lives on the host identified by `base_host`
pub fn is_same_host(url: &Url, base_host: &str) -> bool {
    host_key(url).is_some_and(|host| host == base_host)
}
