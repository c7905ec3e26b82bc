//! Integration tests for the mirror crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! mirror cycle end-to-end into a temporary output directory.

use site_mirror::config::MirrorConfig;
use site_mirror::crawler::{mirror, Mirror};
use site_mirror::output::StopReason;
use site_mirror::rewrite::convert_links;
use site_mirror::state::DownloadedFile;
use site_mirror::ResourceKind;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a mirror configuration writing into `out`
fn create_test_config(out: &Path) -> MirrorConfig {
    MirrorConfig {
        output_path: Some(out.to_path_buf()),
        request_timeout_secs: 5,
        ..MirrorConfig::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a GET mock that must be hit exactly `times` times
async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts a small site: a page, a stylesheet, a second page and an image
async fn mount_small_site(server: &MockServer, external: &str) {
    let base_url = server.uri();

    mount(
        server,
        "/",
        html(format!(
            r#"<html><head><link rel="stylesheet" href="/s.css"></head><body>
            <a href="{}/p.html">Page</a>
            <a href="{}/x.html">External</a>
            </body></html>"#,
            base_url, external
        )),
        1,
    )
    .await;

    // Links back to the seed, which must not be fetched again
    mount(
        server,
        "/p.html",
        html(r#"<html><body><a href="/">Home</a></body></html>"#.to_string()),
        1,
    )
    .await;

    mount(
        server,
        "/s.css",
        ResponseTemplate::new(200)
            .set_body_string("body { background: url(/img/a.png); }")
            .insert_header("content-type", "text/css"),
        1,
    )
    .await;

    mount(
        server,
        "/img/a.png",
        ResponseTemplate::new(200)
            .set_body_bytes(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3])
            .insert_header("content-type", "image/png"),
        1,
    )
    .await;
}

#[tokio::test]
async fn test_full_mirror_with_link_conversion() {
    let mock_server = MockServer::start().await;
    let external = MockServer::start().await;
    mount(&external, "/x.html", html(String::new()), 0).await;
    mount_small_site(&mock_server, &external.uri()).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");
    let config = MirrorConfig {
        convert_links: true,
        ..create_test_config(&out)
    };

    let summary = mirror(&format!("{}/", mock_server.uri()), config)
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 4);
    assert!(summary.failed.is_empty(), "failed: {:?}", summary.failed);
    assert_eq!(summary.stop_reason, StopReason::Completed);
    assert_eq!(summary.levels_processed, 3);
    assert_eq!(summary.converted_files, 3);
    assert_eq!(summary.output_dir, out);

    // Layout follows the URL paths
    assert!(out.join("index.html").is_file());
    assert!(out.join("p.html").is_file());
    assert!(out.join("s.css").is_file());
    assert_eq!(
        std::fs::read(out.join("img").join("a.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3]
    );

    let index = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains(r#"href="s.css""#), "{}", index);
    assert!(index.contains(r#"href="p.html""#), "{}", index);
    // Cross-host references are left alone
    assert!(index.contains(&format!(r#"href="{}/x.html""#, external.uri())));

    let page = std::fs::read_to_string(out.join("p.html")).unwrap();
    assert!(page.contains(r#"href="index.html""#), "{}", page);

    let css = std::fs::read_to_string(out.join("s.css")).unwrap();
    assert_eq!(css, "body { background: url(img/a.png); }");
}

#[tokio::test]
async fn test_links_untouched_without_conversion() {
    let mock_server = MockServer::start().await;
    let external = MockServer::start().await;
    mount_small_site(&mock_server, &external.uri()).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");

    let summary = mirror(&format!("{}/", mock_server.uri()), create_test_config(&out))
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 4);
    assert_eq!(summary.converted_files, 0);

    let index = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains(&format!(r#"href="{}/p.html""#, mock_server.uri())));
    let css = std::fs::read_to_string(out.join("s.css")).unwrap();
    assert_eq!(css, "body { background: url(/img/a.png); }");
}

#[tokio::test]
async fn test_conversion_pass_is_idempotent() {
    let mock_server = MockServer::start().await;
    let external = MockServer::start().await;
    mount_small_site(&mock_server, &external.uri()).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");
    let config = MirrorConfig {
        convert_links: true,
        ..create_test_config(&out)
    };

    mirror(&format!("{}/", mock_server.uri()), config)
        .await
        .expect("Mirror failed");

    let before = std::fs::read_to_string(out.join("index.html")).unwrap();

    let base_host = url::Url::parse(&mock_server.uri())
        .ok()
        .and_then(|url| site_mirror::url::host_key(&url))
        .unwrap();
    let mut downloaded = BTreeMap::new();
    downloaded.insert(
        format!("{}/", mock_server.uri()),
        DownloadedFile {
            local_path: out.join("index.html"),
            kind: ResourceKind::Page,
        },
    );

    let report = convert_links(&downloaded, &base_host, &out);
    assert_eq!(report.converted, 0);
    assert_eq!(report.unchanged, 1);
    assert_eq!(std::fs::read_to_string(out.join("index.html")).unwrap(), before);
}

#[tokio::test]
async fn test_max_files_stops_crawl() {
    let mock_server = MockServer::start().await;

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}.html">{}</a>"#, i, i))
        .collect();
    mount(&mock_server, "/", html(format!("<html><body>{}</body></html>", links)), 1).await;

    // Discovery order decides which pages fit under the cap
    for (i, times) in [(1, 1), (2, 1), (3, 0), (4, 0), (5, 0)] {
        mount(
            &mock_server,
            &format!("/p{}.html", i),
            html("<html></html>".to_string()),
            times,
        )
        .await;
    }

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");
    let config = MirrorConfig {
        max_files: 3,
        ..create_test_config(&out)
    };

    let summary = mirror(&format!("{}/", mock_server.uri()), config)
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 3);
    assert_eq!(summary.stop_reason, StopReason::FileLimit);
    assert!(!out.join("p3.html").exists());
}

#[tokio::test]
async fn test_max_depth_bounds_recursion() {
    let mock_server = MockServer::start().await;

    mount(&mock_server, "/", html(r#"<a href="/d1.html">1</a>"#.to_string()), 1).await;
    mount(&mock_server, "/d1.html", html(r#"<a href="/d2.html">2</a>"#.to_string()), 1).await;
    mount(&mock_server, "/d2.html", html(r#"<a href="/d3.html">3</a>"#.to_string()), 0).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");
    let config = MirrorConfig {
        max_depth: 2,
        ..create_test_config(&out)
    };

    let summary = mirror(&format!("{}/", mock_server.uri()), config)
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(summary.levels_processed, 2);
    assert_eq!(summary.stop_reason, StopReason::DepthLimit);
}

#[tokio::test]
async fn test_failed_fetch_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;

    mount(
        &mock_server,
        "/",
        html(r#"<a href="/missing.html">M</a><a href="/ok.html">OK</a>"#.to_string()),
        1,
    )
    .await;
    mount(&mock_server, "/missing.html", ResponseTemplate::new(404), 1).await;
    mount(&mock_server, "/ok.html", html("<p>ok</p>".to_string()), 1).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");

    let summary = mirror(&format!("{}/", mock_server.uri()), create_test_config(&out))
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(summary.failed, vec![format!("{}/missing.html", mock_server.uri())]);
    assert_eq!(summary.stop_reason, StopReason::Completed);
    assert!(out.join("ok.html").is_file());
    assert!(!out.join("missing.html").exists());
}

#[tokio::test]
async fn test_reject_and_exclude_filters() {
    let mock_server = MockServer::start().await;

    mount(
        &mock_server,
        "/",
        html(
            r#"<img src="/photo.JPG"><a href="/private/x.html">P</a><a href="/keep.html">K</a>"#
                .to_string(),
        ),
        1,
    )
    .await;
    mount(&mock_server, "/photo.JPG", ResponseTemplate::new(200), 0).await;
    mount(&mock_server, "/private/x.html", html(String::new()), 0).await;
    mount(&mock_server, "/keep.html", html(String::new()), 1).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");
    let config = MirrorConfig {
        reject: vec!["jpg".to_string()],
        exclude: vec!["/private".to_string()],
        ..create_test_config(&out)
    };

    let summary = mirror(&format!("{}/", mock_server.uri()), config)
        .await
        .expect("Mirror failed");

    assert_eq!(summary.files_downloaded, 2);
    assert!(out.join("keep.html").is_file());
    assert!(!out.join("private").exists());
}

#[tokio::test]
async fn test_directory_urls_saved_as_index() {
    let mock_server = MockServer::start().await;

    mount(&mock_server, "/", html(r#"<a href="/docs/">Docs</a>"#.to_string()), 1).await;
    mount(&mock_server, "/docs/", html("<h1>Docs</h1>".to_string()), 1).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("site");

    mirror(&format!("{}/", mock_server.uri()), create_test_config(&out))
        .await
        .expect("Mirror failed");

    let docs = std::fs::read_to_string(out.join("docs").join("index.html")).unwrap();
    assert_eq!(docs, "<h1>Docs</h1>");
}

#[tokio::test]
async fn test_concurrency_does_not_change_result() {
    for concurrency in [1, 8] {
        let mock_server = MockServer::start().await;

        let links: String = (1..=6)
            .map(|i| format!(r#"<a href="/p{}.html">{}</a>"#, i, i))
            .collect();
        mount(&mock_server, "/", html(links), 1).await;
        for i in 1..=6 {
            // Every page links to every other page
            let back: String = (1..=6).map(|j| format!(r#"<a href="/p{}.html"></a>"#, j)).collect();
            mount(&mock_server, &format!("/p{}.html", i), html(back), 1).await;
        }

        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("site");
        let config = MirrorConfig {
            concurrency,
            ..create_test_config(&out)
        };

        let summary = mirror(&format!("{}/", mock_server.uri()), config)
            .await
            .expect("Mirror failed");

        assert_eq!(summary.files_downloaded, 7, "concurrency {}", concurrency);
        assert_eq!(summary.levels_processed, 2, "concurrency {}", concurrency);
        for i in 1..=6 {
            assert!(out.join(format!("p{}.html", i)).is_file());
        }
    }
}

#[tokio::test]
async fn test_output_dir_defaults_to_host() {
    let mock_server = MockServer::start().await;
    let mirror = Mirror::new(&format!("{}/", mock_server.uri()), MirrorConfig::default())
        .expect("Failed to create mirror");

    let host = mock_server.uri().trim_start_matches("http://").to_string();
    assert_eq!(mirror.output_dir(), Path::new(&host));
}
