//! Integration tests for asset resolution

use audio_harvest::config::Config;
use audio_harvest::crawler::Fetcher;
use audio_harvest::{AssetResolver, Entry, SourceOrigin};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver() -> AssetResolver {
    let mut config = Config::default();
    config.download.probe_timeout_secs = 2;
    config.download.detail_timeout_secs = 2;
    AssetResolver::new(&config, Fetcher::new().unwrap()).unwrap()
}

#[tokio::test]
async fn test_detail_page_dom_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/music/forest-9/"))
        .and(header("referer", "https://pixabay.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                 <a href="/login">Sign in</a>
                 <a href="/files/forest-9.mp3" download>Download</a>
               </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let source_ref = format!("{}/music/forest-9/", mock_server.uri());
    let resolved = resolver().resolve(&source_ref, "Forest").await;

    assert_eq!(resolved, format!("{}/files/forest-9.mp3", mock_server.uri()));
}

#[tokio::test]
async fn test_unreachable_detail_page_returns_source_ref() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/music/missing-1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let source_ref = format!("{}/music/missing-1/", mock_server.uri());
    assert_eq!(resolver().resolve(&source_ref, "Missing").await, source_ref);
}

#[tokio::test]
async fn test_alternates_probed_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/2023/77.mp3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/2024/77.mp3"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/get/77.mp3"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "audio/mpeg"))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let entry = Entry::new(
        1,
        "Synth",
        format!("{}/2023/77.mp3", uri),
        SourceOrigin::SynthesizedId,
    )
    .with_alternates(vec![
        format!("{}/2024/77.mp3", uri),
        format!("{}/get/77.mp3", uri),
        format!("{}/never/77.mp3", uri),
    ]);

    assert_eq!(
        resolver().resolve_entry(&entry).await,
        format!("{}/get/77.mp3", uri)
    );
}

#[tokio::test]
async fn test_unconfirmed_asset_returns_source_ref() {
    let mock_server = MockServer::start().await;

    let source_ref = format!("{}/dead/track.mp3", mock_server.uri());
    assert_eq!(resolver().resolve(&source_ref, "Dead").await, source_ref);
}

#[tokio::test]
async fn test_audio_served_detail_url_resolves_to_itself() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stream/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(br#"<a href="/files/some-other-track.mp3">x</a>"#.as_slice())
                .insert_header("content-type", "audio/mpeg"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let source_ref = format!("{}/stream/42", mock_server.uri());
    assert_eq!(resolver().resolve(&source_ref, "Stream").await, source_ref);
}
