//! Integration tests for the download pool
//!
//! Assets are served by wiremock and written into tempfile directories to
//! check numbering, continuation and per-job failure isolation.

use audio_harvest::config::{Config, HeaderProfileConfig};
use audio_harvest::crawler::Fetcher;
use audio_harvest::download::DownloadOrchestrator;
use audio_harvest::output::{consume_events, event_channel};
use audio_harvest::{Entry, SourceOrigin};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config.download.timeout_secs = 5;
    config.download.probe_timeout_secs = 2;
    config.download.detail_timeout_secs = 2;
    config
}

/// Config whose two header profiles are told apart by user agent
fn two_profile_config() -> Config {
    let mut config = create_test_config();
    config.headers.primary = HeaderProfileConfig {
        name: "primary".to_string(),
        user_agent: "PrimaryAgent/1.0".to_string(),
        accept: "*/*".to_string(),
        accept_language: "en".to_string(),
        referer: None,
        origin: None,
    };
    config.headers.alternate = HeaderProfileConfig {
        name: "alternate".to_string(),
        user_agent: "AlternateAgent/1.0".to_string(),
        accept: "*/*".to_string(),
        accept_language: "en".to_string(),
        referer: None,
        origin: None,
    };
    config
}

fn orchestrator() -> DownloadOrchestrator {
    DownloadOrchestrator::new(&create_test_config(), Fetcher::new().unwrap())
        .unwrap()
        .with_concurrency(3)
}

/// Serves `body` as audio at `asset_path` for both HEAD and GET
async fn mount_asset(server: &MockServer, asset_path: &str, body: &'static [u8]) {
    Mock::given(method("HEAD"))
        .and(path(asset_path))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "audio/mpeg"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(asset_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("content-type", "audio/mpeg"),
        )
        .mount(server)
        .await;
}

fn asset_entry(server: &MockServer, index: usize, title: &str, asset_path: &str) -> Entry {
    Entry::new(
        index,
        title,
        format!("{}{}", server.uri(), asset_path),
        SourceOrigin::MediaElement,
    )
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_download_range_writes_numbered_files() {
    let mock_server = MockServer::start().await;
    mount_asset(&mock_server, "/a/one.mp3", b"ONE").await;
    mount_asset(&mock_server, "/a/two.mp3", b"TWO-TWO").await;
    mount_asset(&mock_server, "/a/three.mp3", b"THREE").await;

    let entries = vec![
        asset_entry(&mock_server, 1, "One", "/a/one.mp3"),
        asset_entry(&mock_server, 2, "Two: Remix?", "/a/two.mp3"),
        asset_entry(&mock_server, 3, "Three", "/a/three.mp3"),
    ];

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("music");

    let report = orchestrator()
        .download_range(&entries, 2, 3, &dest)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total_bytes, 12);
    assert_eq!(listing(&dest), vec!["001_Two_ Remix_.mp3", "002_Three.mp3"]);
    assert_eq!(std::fs::read(dest.join("002_Three.mp3")).unwrap(), b"THREE");
}

#[tokio::test]
async fn test_partial_failure_keeps_siblings() {
    let mock_server = MockServer::start().await;
    mount_asset(&mock_server, "/ok/1.mp3", b"first").await;
    mount_asset(&mock_server, "/ok/3.mp3", b"third").await;

    Mock::given(method("GET"))
        .and(path("/gone/2.mp3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let entries = vec![
        asset_entry(&mock_server, 1, "First", "/ok/1.mp3"),
        asset_entry(&mock_server, 2, "Second", "/gone/2.mp3"),
        asset_entry(&mock_server, 3, "Third", "/ok/3.mp3"),
    ];

    let temp = TempDir::new().unwrap();
    let (sink, stream) = event_channel();
    let consumer = tokio::spawn(consume_events(stream));

    let orchestrator = orchestrator().with_events(sink);
    let report = orchestrator
        .download_range(&entries, 1, 3, temp.path())
        .await
        .unwrap();
    drop(orchestrator);

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded + report.failed, entries.len());

    let failed = report.results.iter().find(|r| !r.success).unwrap();
    assert_eq!(failed.entry_index, 2);
    assert_eq!(failed.file_number, 2);
    assert!(failed.error.as_deref().unwrap().contains("404"));

    // No partial file survives the failed job
    assert_eq!(listing(temp.path()), vec!["001_First.mp3", "003_Third.mp3"]);

    let tally = consumer.await.unwrap();
    assert_eq!(tally.dispatched, 3);
    assert_eq!(tally.succeeded, 2);
    assert_eq!(tally.failed, 1);
}

#[tokio::test]
async fn test_second_run_continues_numbering() {
    let mock_server = MockServer::start().await;
    mount_asset(&mock_server, "/x/a.mp3", b"a").await;
    mount_asset(&mock_server, "/x/b.mp3", b"b").await;

    let entries = vec![
        asset_entry(&mock_server, 1, "Alpha", "/x/a.mp3"),
        asset_entry(&mock_server, 2, "Beta", "/x/b.mp3"),
    ];

    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("notes.txt"), b"keep").unwrap();

    let first = orchestrator()
        .download_range(&entries, 1, 2, temp.path())
        .await
        .unwrap();
    assert_eq!(first.succeeded, 2);

    let second = orchestrator()
        .download_range(&entries, 1, 2, temp.path())
        .await
        .unwrap();
    assert_eq!(second.succeeded, 2);

    let numbers: Vec<_> = second.results.iter().map(|r| r.file_number).collect();
    assert_eq!(numbers, vec![3, 4]);

    assert_eq!(
        listing(temp.path()),
        vec![
            "001_Alpha.mp3",
            "002_Beta.mp3",
            "003_Alpha.mp3",
            "004_Beta.mp3",
            "notes.txt"
        ]
    );
}

#[tokio::test]
async fn test_detail_page_entry_is_resolved_before_download() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/music/rain-12/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><head><script>
                         window.track = {{"download": "{}/cdn/audio/rain-full.mp3"}};
                       </script></head><body></body></html>"#,
                    mock_server.uri()
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/audio/rain-full.mp3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"RAIN".as_slice())
                .insert_header("content-type", "audio/mpeg"),
        )
        .mount(&mock_server)
        .await;

    let entries = vec![Entry::new(
        1,
        "Rain",
        format!("{}/music/rain-12/", mock_server.uri()),
        SourceOrigin::DetailPage,
    )];

    let temp = TempDir::new().unwrap();
    let report = orchestrator()
        .download_range(&entries, 1, 1, temp.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(
        report.results[0].resolved_url.as_deref(),
        Some(format!("{}/cdn/audio/rain-full.mp3", mock_server.uri()).as_str())
    );
    assert_eq!(std::fs::read(temp.path().join("001_Rain.mp3")).unwrap(), b"RAIN");
}

#[tokio::test]
async fn test_non_audio_content_type_still_saves() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odd/file.mp3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"<html>".as_slice())
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let entries = Entry::direct_list([format!("{}/odd/file.mp3", mock_server.uri())]);

    let temp = TempDir::new().unwrap();
    let report = orchestrator()
        .download_range(&entries, 1, 1, temp.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(listing(temp.path()), vec!["001_Direct Download 1.mp3"]);
}

#[tokio::test]
async fn test_invalid_range_creates_no_directory() {
    let mock_server = MockServer::start().await;
    let entries = vec![asset_entry(&mock_server, 1, "Only", "/only.mp3")];

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("never");

    for (start, end) in [(5, 3), (0, 2), (1, 2)] {
        assert!(orchestrator()
            .download_range(&entries, start, end, &dest)
            .await
            .is_err());
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_forbidden_download_retries_with_alternate_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locked/rain.mp3"))
        .and(header("user-agent", "PrimaryAgent/1.0"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/locked/rain.mp3"))
        .and(header("user-agent", "AlternateAgent/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"RAIN".as_slice())
                .insert_header("content-type", "audio/mpeg"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let entries = vec![asset_entry(&mock_server, 1, "Rain", "/locked/rain.mp3")];
    let temp = TempDir::new().unwrap();

    let orchestrator = DownloadOrchestrator::new(&two_profile_config(), Fetcher::new().unwrap())
        .unwrap()
        .with_concurrency(1);
    let report = orchestrator
        .download_range(&entries, 1, 1, temp.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(listing(temp.path()), vec!["001_Rain.mp3"]);
    assert_eq!(std::fs::read(temp.path().join("001_Rain.mp3")).unwrap(), b"RAIN");
}

#[tokio::test]
async fn test_missing_download_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing/rain.mp3"))
        .and(header("user-agent", "PrimaryAgent/1.0"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing/rain.mp3"))
        .and(header("user-agent", "AlternateAgent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RAIN".as_slice()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let entries = vec![asset_entry(&mock_server, 1, "Rain", "/missing/rain.mp3")];
    let temp = TempDir::new().unwrap();

    let orchestrator = DownloadOrchestrator::new(&two_profile_config(), Fetcher::new().unwrap())
        .unwrap()
        .with_concurrency(1);
    let report = orchestrator
        .download_range(&entries, 1, 1, temp.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 1);
    assert!(listing(temp.path()).is_empty());
}
