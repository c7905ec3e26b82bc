//! Integration tests for single and batch downloads

use site_mirror::config::DownloadConfig;
use site_mirror::download::{download_batch, download_file, download_from_file};
use site_mirror::{FetchError, MirrorError};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(dir: &Path) -> DownloadConfig {
    DownloadConfig {
        output_path: Some(dir.to_path_buf()),
        request_timeout_secs: 5,
        ..DownloadConfig::default()
    }
}

async fn mount_file(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_download_named_after_url() {
    let mock_server = MockServer::start().await;
    mount_file(&mock_server, "/files/data.bin", b"payload".to_vec()).await;

    let tmp = TempDir::new().unwrap();
    let saved = download_file(
        &format!("{}/files/data.bin", mock_server.uri()),
        &create_test_config(tmp.path()),
    )
    .await
    .expect("Download failed");

    assert_eq!(saved, tmp.path().join("data.bin"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"payload");
}

#[tokio::test]
async fn test_single_download_with_output_name() {
    let mock_server = MockServer::start().await;
    mount_file(&mock_server, "/files/data.bin", b"payload".to_vec()).await;

    let tmp = TempDir::new().unwrap();
    let config = DownloadConfig {
        output_name: Some("renamed.bin".to_string()),
        ..create_test_config(&tmp.path().join("nested"))
    };

    let saved = download_file(&format!("{}/files/data.bin", mock_server.uri()), &config)
        .await
        .expect("Download failed");

    assert_eq!(saved, tmp.path().join("nested").join("renamed.bin"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"payload");
}

#[tokio::test]
async fn test_single_download_status_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let result = download_file(
        &format!("{}/gone.bin", mock_server.uri()),
        &create_test_config(tmp.path()),
    )
    .await;

    assert!(matches!(
        result,
        Err(MirrorError::Fetch(FetchError::Status { status: 404, .. }))
    ));
    assert!(!tmp.path().join("gone.bin").exists());
}

#[tokio::test]
async fn test_single_download_respects_rate_limit() {
    let mock_server = MockServer::start().await;
    mount_file(&mock_server, "/big.bin", vec![7u8; 3 * 1024]).await;

    let tmp = TempDir::new().unwrap();
    let config = DownloadConfig {
        rate_limit: "2k".to_string(),
        ..create_test_config(tmp.path())
    };

    let started = Instant::now();
    let saved = download_file(&format!("{}/big.bin", mock_server.uri()), &config)
        .await
        .expect("Download failed");

    // One second of burst is free; the last KiB waits about half a second
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert_eq!(std::fs::read(saved).unwrap().len(), 3 * 1024);
}

#[tokio::test]
async fn test_batch_download_from_list_file() {
    let mock_server = MockServer::start().await;
    mount_file(&mock_server, "/a.txt", b"alpha".to_vec()).await;
    mount_file(&mock_server, "/b.txt", b"beta".to_vec()).await;

    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("urls.txt");
    std::fs::write(
        &list,
        format!(
            "# files\n{0}/a.txt\n\n{0}/b.txt\n",
            mock_server.uri()
        ),
    )
    .unwrap();

    let out = tmp.path().join("out");
    let mut succeeded = download_from_file(&list, &create_test_config(&out))
        .await
        .expect("Batch failed");
    succeeded.sort();

    assert_eq!(
        succeeded,
        vec![
            format!("{}/a.txt", mock_server.uri()),
            format!("{}/b.txt", mock_server.uri()),
        ]
    );
    assert_eq!(std::fs::read(out.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(out.join("b.txt")).unwrap(), b"beta");
}

#[tokio::test]
async fn test_batch_failure_does_not_cancel_others() {
    let mock_server = MockServer::start().await;
    mount_file(&mock_server, "/a.txt", b"alpha".to_vec()).await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/missing.txt", mock_server.uri()),
        format!("{}/a.txt", mock_server.uri()),
    ];

    let result = download_batch(urls, &create_test_config(tmp.path())).await;

    assert!(result.is_err());
    assert_eq!(std::fs::read(tmp.path().join("a.txt")).unwrap(), b"alpha");
}

#[tokio::test]
async fn test_batch_empty_list_file_is_error() {
    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("urls.txt");
    std::fs::write(&list, "# nothing here\n\n").unwrap();

    let result = download_from_file(&list, &create_test_config(tmp.path())).await;
    assert!(result.is_err());
}
