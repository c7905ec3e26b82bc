//! Single-file download with progress reporting

use crate::config::{expand_home, DownloadConfig};
use crate::crawler::{
    build_http_client, classify_error, create_file, stream_body, ByteRateLimiter,
};
use crate::download::progress::ProgressTracker;
use crate::url::{host_key, parse_http_url};
use crate::{FetchError, MirrorError};
use std::path::PathBuf;
use url::Url;

/// Timestamp format of the start and finish lines
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

/// File name a URL is saved under when no name is given
///
/// The last non-empty path segment, or the host when the path has none.
pub fn default_file_name(url: &Url) -> String {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .or_else(|| host_key(url))
        .unwrap_or_else(|| "index.html".to_string())
}

/// Full path a download is written to
pub fn output_file_path(url: &Url, config: &DownloadConfig) -> PathBuf {
    let name = config
        .output_name
        .clone()
        .unwrap_or_else(|| default_file_name(url));

    let dir = config
        .output_path
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(|| PathBuf::from("."));

    dir.join(name)
}

/// Downloads one URL to a file
///
/// Logs status lines (start time, response status,
/// content size, target path, completion), streams the body through the
/// byte-rate limiter and draws a progress line when enabled.
///
/// # Errors
///
/// Unlike a mirror run, an unusable rate limit is an error here, as are a
/// non-2xx status, network failures and write failures.
pub async fn download_file(url: &str, config: &DownloadConfig) -> Result<PathBuf, MirrorError> {
    tracing::info!("start at {}", now());

    let url = parse_http_url(url)?;

    let limiter = if config.rate_limit.trim().is_empty() {
        None
    } else {
        Some(ByteRateLimiter::from_spec(&config.rate_limit)?)
    };

    let client = build_http_client(&config.user_agent, config.request_timeout())?;
    let mut response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| classify_error(&url, e))?;

    let status = response.status();
    tracing::info!("sending request, awaiting response... status {}", status);
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let content_length = response.content_length();
    if let Some(size) = content_length.filter(|size| *size > 0) {
        tracing::info!(
            "content size: {} [~{:.2}MB]",
            size,
            size as f64 / 1024.0 / 1024.0
        );
    }

    let path = output_file_path(&url, config);
    tracing::info!("saving file to: {}", path.display());

    let mut file = create_file(&path).await?;
    let mut progress = ProgressTracker::new(content_length, config.show_progress);
    let downloaded = stream_body(&mut response, limiter.as_ref(), &mut file, |total| {
        progress.update(total)
    })
    .await
    .map_err(|e| e.into_fetch_error(&url, &path))?;
    progress.finish(downloaded);

    tracing::info!("Downloaded [{}]", url);
    tracing::info!("finished at {}", now());

    Ok(path)
}
