//! Integration tests for the crawl pool
//!
//! These tests use wiremock to serve listing pages and check ordering,
//! failure accounting and the alternate-profile retry end-to-end.

use audio_harvest::config::{Config, HeaderProfileConfig};
use audio_harvest::crawler::{CrawlOrchestrator, Fetcher};
use audio_harvest::output::{consume_events, event_channel};
use audio_harvest::SourceOrigin;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no politeness delay
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config.crawler.timeout_secs = 5;
    config
}

/// Renders a listing page with one `audioRow` per slug
fn listing_page(slugs: &[&str]) -> String {
    let rows: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="audioRow--x9">
                     <a class="title--7N7Nr" href="/music/{slug}/">{title}</a>
                   </div>"#,
                slug = slug,
                title = slug.replace('-', " ")
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", rows)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_pages_merge_in_page_order_despite_completion_order() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/music/search/", mock_server.uri());

    // Page 2 answers immediately; mounted first so it takes precedence
    Mock::given(method("GET"))
        .and(path("/music/search/"))
        .and(query_param("pagi", "2"))
        .respond_with(html(listing_page(&["late-night-22"])))
        .mount(&mock_server)
        .await;

    // Page 1 is the bare base URL and answers slowly
    Mock::given(method("GET"))
        .and(path("/music/search/"))
        .respond_with(
            html(listing_page(&["morning-rain-11", "city-walk-12"]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let orchestrator = CrawlOrchestrator::new(&create_test_config(), Fetcher::new().unwrap())
        .unwrap()
        .with_concurrency(2);
    let report = orchestrator.crawl(&base_url, 1, 2).await.unwrap();

    assert_eq!(report.total_pages, 2);
    assert_eq!(report.succeeded_pages, 2);
    assert_eq!(report.failed_pages, 0);

    let titles: Vec<_> = report.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["morning rain 11", "city walk 12", "late night 22"]);

    let indices: Vec<_> = report.entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);

    let pages: Vec<_> = report.entries.iter().map(|e| e.page).collect();
    assert_eq!(pages, vec![1, 1, 2]);

    assert_eq!(
        report.entries[2].source_ref,
        format!("{}/music/late-night-22/", mock_server.uri())
    );
    assert_eq!(report.entries[2].origin, SourceOrigin::DetailPage);
}

#[tokio::test]
async fn test_failed_page_is_counted_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/list?pagi=1", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("pagi", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("pagi", "1"))
        .respond_with(html(listing_page(&["first-1"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("pagi", "3"))
        .respond_with(html(listing_page(&["third-3", "third-4"])))
        .mount(&mock_server)
        .await;

    let orchestrator =
        CrawlOrchestrator::new(&create_test_config(), Fetcher::new().unwrap()).unwrap();
    let report = orchestrator.crawl(&base_url, 1, 3).await.unwrap();

    assert_eq!(report.succeeded_pages, 2);
    assert_eq!(report.failed_pages, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 2);

    let pages: Vec<_> = report.entries.iter().map(|e| e.page).collect();
    assert_eq!(pages, vec![1, 3, 3]);
    let indices: Vec<_> = report.entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_alternate_profile_retry_after_403() {
    let mock_server = MockServer::start().await;

    let mut config = create_test_config();
    config.headers.primary = HeaderProfileConfig {
        name: "primary".to_string(),
        user_agent: "PrimaryAgent/1.0".to_string(),
        accept: "text/html".to_string(),
        accept_language: "en".to_string(),
        referer: None,
        origin: None,
    };
    config.headers.alternate = HeaderProfileConfig {
        name: "alternate".to_string(),
        user_agent: "AlternateAgent/1.0".to_string(),
        accept: "*/*".to_string(),
        accept_language: "en".to_string(),
        referer: Some(format!("{}/", mock_server.uri())),
        origin: None,
    };

    Mock::given(method("GET"))
        .and(header("user-agent", "PrimaryAgent/1.0"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(header("user-agent", "AlternateAgent/1.0"))
        .respond_with(html(listing_page(&["blocked-once-5"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orchestrator = CrawlOrchestrator::new(&config, Fetcher::new().unwrap()).unwrap();
    let report = orchestrator
        .crawl(&format!("{}/music/", mock_server.uri()), 1, 1)
        .await
        .unwrap();

    assert_eq!(report.succeeded_pages, 1);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].title, "blocked once 5");
}

#[tokio::test]
async fn test_script_fallback_and_empty_pages() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/browse", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/browse"))
        .and(query_param("pagi", "2"))
        .respond_with(html("<html><body><p>No results</p></body></html>".to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse"))
        .respond_with(html(
            r#"<html><body>
                 <p>Loading player...</p>
                 <script>var audio = "https://cdn.example.com/files/ambient-loop.mp3";</script>
               </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let (sink, stream) = event_channel();
    let consumer = tokio::spawn(consume_events(stream));

    let orchestrator = CrawlOrchestrator::new(&create_test_config(), Fetcher::new().unwrap())
        .unwrap()
        .with_events(sink);
    let report = orchestrator.crawl(&base_url, 1, 2).await.unwrap();
    drop(orchestrator);

    assert_eq!(report.succeeded_pages, 2);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].origin, SourceOrigin::Script);
    assert_eq!(
        report.entries[0].source_ref,
        "https://cdn.example.com/files/ambient-loop.mp3"
    );

    let tally = consumer.await.unwrap();
    assert_eq!(tally.dispatched, 2);
    assert_eq!(tally.succeeded, 2);
    assert_eq!(tally.failed, 0);
}

#[tokio::test]
async fn test_invalid_page_range_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let orchestrator =
        CrawlOrchestrator::new(&create_test_config(), Fetcher::new().unwrap()).unwrap();

    assert!(orchestrator.crawl(&mock_server.uri(), 5, 3).await.is_err());
    assert!(orchestrator.crawl(&mock_server.uri(), 0, 2).await.is_err());
}
