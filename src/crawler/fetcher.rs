//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made while mirroring:
//! - Building the shared HTTP client with user agent and timeout
//! - GET requests with the body streamed through the byte-rate limiter
//! - Persisting the body at the URL's deterministic local path; only pages
//!   and stylesheets are kept in memory for scanning, everything else goes
//!   straight to disk
//! - Error classification into recoverable [`FetchError`]s

use crate::crawler::limiter::ByteRateLimiter;
use crate::url::{classify_url, local_path, ResourceKind};
use crate::FetchError;
use indicatif::HumanBytes;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("site-mirror/", env!("CARGO_PKG_VERSION"));

/// A resource that was fetched and written to disk
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// The URL that was requested
    pub url: Url,

    /// Where the body was saved
    pub local_path: PathBuf,

    /// Kind from the declared content type, falling back to the URL suffix
    pub kind: ResourceKind,

    /// Bytes written to disk
    pub size: u64,

    /// Body of a page or stylesheet, kept for scanning; `None` for other kinds
    pub content: Option<Vec<u8>>,
}

/// Failure while moving a response body into a sink
#[derive(Debug)]
pub(crate) enum BodyError {
    Read(reqwest::Error),
    Write(std::io::Error),
}

impl BodyError {
    /// Maps onto the per-resource taxonomy; `path` names the sink
    pub(crate) fn into_fetch_error(self, url: &Url, path: &Path) -> FetchError {
        match self {
            Self::Read(e) => classify_error(url, e),
            Self::Write(source) => FetchError::Write {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy; the final body is
/// saved under the path of the URL that was requested.
///
/// # Arguments
///
/// * `user_agent` - Value of the `User-Agent` header
/// * `timeout` - Overall per-request timeout
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use site_mirror::crawler::{build_http_client, DEFAULT_USER_AGENT};
///
/// let client = build_http_client(DEFAULT_USER_AGENT, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Streams a response body into `sink`, admitting each chunk through the limiter
///
/// This is the only place body bytes pass the limiter, for crawl fetches and
/// single downloads alike. `on_chunk` is called with the running byte total
/// after every chunk. Returns the number of bytes written.
pub(crate) async fn stream_body<W>(
    response: &mut Response,
    limiter: Option<&ByteRateLimiter>,
    sink: &mut W,
    mut on_chunk: impl FnMut(u64),
) -> Result<u64, BodyError>
where
    W: AsyncWrite + Unpin,
{
    let mut total: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(BodyError::Read)? {
        if let Some(limiter) = limiter {
            limiter.acquire(chunk.len()).await;
        }
        sink.write_all(&chunk).await.map_err(BodyError::Write)?;
        total += chunk.len() as u64;
        on_chunk(total);
    }

    sink.flush().await.map_err(BodyError::Write)?;
    Ok(total)
}

/// Maps a reqwest error onto the per-resource taxonomy
pub(crate) fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Rate-limited fetch-and-save worker shared by all crawl tasks
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Option<Arc<ByteRateLimiter>>,
}

impl Fetcher {
    /// Creates a fetcher; `None` disables rate limiting
    pub fn new(client: Client, limiter: Option<Arc<ByteRateLimiter>>) -> Self {
        Self { client, limiter }
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns true if fetches are rate limited
    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Fetches `url` and writes the body under `output_dir`
    ///
    /// # Request Flow
    ///
    /// 1. GET with the client's timeout
    /// 2. Non-2xx status → [`FetchError::Status`]
    /// 3. Stream the body, acquiring one token per byte: pages and
    ///    stylesheets into memory and then to disk, other kinds directly
    ///    into the file
    /// 4. Parent directories are created on demand
    ///
    /// Every failure is recoverable: the caller logs it and abandons the URL.
    pub async fn fetch_and_save(
        &self,
        url: &Url,
        output_dir: &Path,
    ) -> Result<FetchedResource, FetchError> {
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared_kind = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(ResourceKind::from_content_type);
        let kind = declared_kind.unwrap_or_else(|| classify_url(url));

        let path = local_path(url, output_dir);
        let limiter = self.limiter.as_deref();

        let (size, content) = if kind.is_parseable() {
            let mut body = Vec::new();
            stream_body(&mut response, limiter, &mut body, |_| {})
                .await
                .map_err(|e| e.into_fetch_error(url, &path))?;
            save(&path, &body).await?;
            (body.len() as u64, Some(body))
        } else {
            let mut file = create_file(&path).await?;
            let streamed = stream_body(&mut response, limiter, &mut file, |_| {}).await;
            match streamed {
                Ok(size) => (size, None),
                Err(e) => {
                    drop(file);
                    // No partial files for resources recorded as failed
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(e.into_fetch_error(url, &path));
                }
            }
        };

        tracing::debug!("Saved {} ({}, {})", url, kind, HumanBytes(size));

        Ok(FetchedResource {
            url: url.clone(),
            local_path: path,
            kind,
            size,
            content,
        })
    }
}

/// Creates `path` for writing, creating intermediate directories first
pub(crate) async fn create_file(path: &Path) -> Result<tokio::fs::File, FetchError> {
    create_parent(path).await?;
    tokio::fs::File::create(path)
        .await
        .map_err(|source| FetchError::Write {
            path: path.to_path_buf(),
            source,
        })
}

async fn create_parent(path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| FetchError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Writes `body` to `path`, creating intermediate directories first
async fn save(path: &Path, body: &[u8]) -> Result<(), FetchError> {
    create_parent(path).await?;
    tokio::fs::write(path, body)
        .await
        .map_err(|source| FetchError::Write {
            path: path.to_path_buf(),
            source,
        })
}
