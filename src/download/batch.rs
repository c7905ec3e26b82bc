//! Batch download of an explicit URL list
//!
//! Every URL is an independent task with its own client and no shared crawl
//! state. Results are fanned in over a channel in completion order.

use crate::config::DownloadConfig;
use crate::crawler::build_http_client;
use crate::download::single::download_file;
use crate::MirrorError;
use anyhow::{bail, Context};
use futures::future::join_all;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Parses the contents of a URL list file
///
/// UTF-8 (with or without a byte-order mark) and UTF-16 with a byte-order
/// mark are accepted. Lines are trimmed, leading control characters are
/// dropped, and blank lines and `#` comments are skipped.
///
/// ```
/// use site_mirror::download::parse_url_list;
///
/// let text = "\u{feff}# mirrors\nhttp://ex.com/a.zip\r\n\n  http://ex.com/b.zip  \n";
/// assert_eq!(
///     parse_url_list(text.as_bytes()),
///     vec!["http://ex.com/a.zip", "http://ex.com/b.zip"]
/// );
/// ```
pub fn parse_url_list(bytes: &[u8]) -> Vec<String> {
    let text = decode_text(bytes);

    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_control())
                .replace('\0', "")
        })
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn decode_text(bytes: &[u8]) -> String {
    let utf16 = |rest: &[u8], from: fn([u8; 2]) -> u16| {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| from([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    };

    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Reads and parses a URL list file
pub fn read_url_list(path: &Path) -> Result<Vec<String>, MirrorError> {
    let bytes = std::fs::read(path)?;
    Ok(parse_url_list(&bytes))
}

/// Name shown in the per-file completion line
pub fn display_name(url: &str) -> &str {
    match url.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => url,
    }
}

/// Probes every URL with HEAD, returning the declared sizes
///
/// Failures and missing lengths are `None`; probing never fails the batch.
pub async fn head_content_sizes(client: &Client, urls: &[String]) -> Vec<Option<u64>> {
    let requests = urls.iter().map(|url| async move {
        match client.head(url.as_str()).send().await {
            Ok(response) if response.status().is_success() => {
                response.content_length().filter(|size| *size > 0)
            }
            Ok(response) => {
                tracing::debug!("HEAD {} returned {}", url, response.status());
                None
            }
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                None
            }
        }
    });

    join_all(requests).await
}

/// Downloads every URL concurrently into the configured directory
///
/// Returns the URLs that succeeded, in completion order, or the first
/// failure once every task has finished.
pub async fn download_batch(
    urls: Vec<String>,
    config: &DownloadConfig,
) -> anyhow::Result<Vec<String>> {
    if urls.is_empty() {
        bail!("no URLs to download");
    }

    let client = build_http_client(&config.user_agent, config.request_timeout())?;
    tracing::info!("Checking content sizes...");
    let sizes = head_content_sizes(&client, &urls).await;
    if sizes.iter().any(Option::is_some) {
        let shown: Vec<u64> = sizes.iter().map(|size| size.unwrap_or(0)).collect();
        tracing::info!("content size: {:?}", shown);
    }

    // Per-task settings: one shared directory, names derived from each URL
    let task_config = DownloadConfig {
        output_name: None,
        show_progress: false,
        ..config.clone()
    };

    let (tx, mut rx) = mpsc::channel::<(String, Result<PathBuf, MirrorError>)>(urls.len());
    for url in urls {
        let tx = tx.clone();
        let config = task_config.clone();
        tokio::spawn(async move {
            let result = download_file(&url, &config).await;
            if result.is_ok() {
                tracing::info!("finished {}", display_name(&url));
            }
            let _ = tx.send((url, result)).await;
        });
    }
    drop(tx);

    let mut succeeded = Vec::new();
    let mut first_error = None;
    while let Some((url, result)) = rx.recv().await {
        match result {
            Ok(_) => succeeded.push(url),
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", url, e);
                if first_error.is_none() {
                    first_error = Some(
                        anyhow::Error::new(e).context(format!("failed to download {}", url)),
                    );
                }
            }
        }
    }

    if !succeeded.is_empty() {
        tracing::info!("Download finished: {:?}", succeeded);
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(succeeded),
    }
}

/// Reads a URL list file and downloads every entry
pub async fn download_from_file(
    path: &Path,
    config: &DownloadConfig,
) -> anyhow::Result<Vec<String>> {
    let urls = read_url_list(path)
        .with_context(|| format!("failed to read URLs from file: {}", path.display()))?;

    if urls.is_empty() {
        bail!("no URLs found in file: {}", path.display());
    }

    download_batch(urls, config).await
}
