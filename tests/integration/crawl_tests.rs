//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and in-memory
//! transports to test the full crawl cycle end-to-end.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiki_scraper::config::CrawlConfig;
use wiki_scraper::crawler::{
    event_channel, run_crawl, Coordinator, CrawlEvent, CrawlPhase, PageRecord, Transport,
};
use wiki_scraper::output::{read_json_records, save_output, OutputFormat};
use wiki_scraper::{FetchError, ScraperError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no politeness delay
fn create_test_config() -> CrawlConfig {
    CrawlConfig {
        max_concurrent: 5,
        timeout_seconds: 5,
        batch_delay_ms: 0,
        retry_delay_ms: 10,
        ..CrawlConfig::default()
    }
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn titles(pages: &[PageRecord]) -> Vec<String> {
    let mut titles: Vec<String> = pages.iter().map(|p| p.title.clone()).collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(
            "Home",
            r#"<a href="/page1">Page 1</a>
               <a href="page2">Page 2</a>
               <a href="https://external.example/page">External</a>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(
            "Page 1",
            r#"<p>Content 1</p><a href="/">Home</a><a href="/page2">Page 2</a>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(
            "Page 2",
            "<p>Content 2</p><script>track()</script>",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pages = run_crawl(&format!("{}/", base_url), create_test_config())
        .await
        .expect("Crawl failed");

    assert_eq!(pages.len(), 3, "got {:?}", pages);
    assert_eq!(titles(&pages), vec!["Home", "Page 1", "Page 2"]);

    let page2 = pages.iter().find(|p| p.title == "Page 2").unwrap();
    assert_eq!(page2.url, format!("{}/page2", base_url));
    assert!(page2.content.contains("Content 2"));
    assert!(!page2.content.contains("track()"));

    // Wiremock verifies each page was requested exactly once on drop
}

#[tokio::test]
async fn test_not_found_does_not_abort_batch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        200,
        html_page(
            "Home",
            r#"<a href="/good">Good</a><a href="/missing">Missing</a><a href="/other">Other</a>"#,
        ),
    )
    .await;
    mount_page(&mock_server, "/good", 200, html_page("Good", "ok")).await;
    mount_page(&mock_server, "/missing", 404, "not found".to_string()).await;
    mount_page(&mock_server, "/other", 200, html_page("Other", "ok")).await;

    let pages = run_crawl(&format!("{}/", base_url), create_test_config())
        .await
        .expect("Crawl failed");

    assert_eq!(titles(&pages), vec!["Good", "Home", "Other"]);
    assert!(pages.iter().all(|p| !p.url.ends_with("/missing")));
}

#[tokio::test]
async fn test_start_url_unreachable_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", 500, "boom".to_string()).await;

    let (tx, mut rx) = event_channel();
    let coordinator = Coordinator::new(create_test_config())
        .expect("Failed to create coordinator")
        .with_events(tx);

    let result = coordinator.run(&format!("{}/", mock_server.uri())).await;
    match result {
        Err(ScraperError::StartUnreachable { source, .. }) => {
            assert_eq!(source, FetchError::BadStatus(500));
        }
        other => panic!("expected StartUnreachable, got {:?}", other),
    }

    let mut last_phase = None;
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::PhaseChanged(phase) = event {
            last_phase = Some(phase);
        }
    }
    assert_eq!(last_phase, Some(CrawlPhase::Error));
}

#[tokio::test]
async fn test_without_reuse_pages_are_fetched_twice() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Home", r#"<a href="/leaf">Leaf</a>"#)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leaf"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Leaf", "")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = CrawlConfig {
        reuse_discovery_fetches: false,
        ..create_test_config()
    };
    let pages = run_crawl(&format!("{}/", base_url), config)
        .await
        .expect("Crawl failed");

    assert_eq!(titles(&pages), vec!["Home", "Leaf"]);
}

#[tokio::test]
async fn test_retry_policy_recovers_flaky_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        200,
        html_page("Home", r#"<a href="/flaky">Flaky</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", 200, html_page("Flaky", "finally")).await;

    let config = CrawlConfig {
        max_retries: 1,
        ..create_test_config()
    };
    let pages = run_crawl(&format!("{}/", base_url), config)
        .await
        .expect("Crawl failed");

    assert_eq!(titles(&pages), vec!["Flaky", "Home"]);
}

#[tokio::test]
async fn test_crawl_output_json_roundtrip() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        200,
        html_page("Home", r#"<p>Welcome</p><a href="/rules">Rules</a>"#),
    )
    .await;
    mount_page(&mock_server, "/rules", 200, html_page("Rules", "<p>Night phase</p>")).await;

    let pages = run_crawl(&format!("{}/", base_url), create_test_config())
        .await
        .expect("Crawl failed");

    let tmp = tempfile::tempdir().unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let out = save_output(&pages, OutputFormat::Json, tmp.path(), date).unwrap();

    let loaded = read_json_records(&out).unwrap();
    assert_eq!(loaded.len(), pages.len());
    assert_eq!(loaded, pages);
}

/// In-memory wiki that records request statistics
struct FakeWiki {
    pages: HashMap<String, String>,
    delay: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    per_url: Mutex<HashMap<String, usize>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeWiki {
    /// A root page linking to `children` leaf pages
    fn star(children: usize) -> Self {
        let mut pages = HashMap::new();
        let links: String = (0..children)
            .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
            .collect();
        pages.insert("https://wiki.test/".to_string(), html_page("Root", &links));
        for i in 0..children {
            pages.insert(
                format!("https://wiki.test/p{}", i),
                html_page(&format!("P{}", i), r#"<a href="/">Back</a>"#),
            );
        }

        Self::with_pages(pages)
    }

    fn with_pages(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            delay: Duration::from_millis(20),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            per_url: Mutex::new(HashMap::new()),
            cancel_after: None,
        }
    }
}

impl Transport for FakeWiki {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send + 'a {
        async move {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self
                .per_url
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_insert(0) += 1;

            if let Some((limit, token)) = &self.cancel_after {
                if calls >= *limit {
                    token.cancel();
                }
            }

            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            // like most servers, answer `/x/` with the page at `/x`
            self.pages
                .get(url)
                .or_else(|| self.pages.get(url.trim_end_matches('/')))
                .cloned()
                .ok_or(FetchError::BadStatus(404))
        }
    }
}

#[tokio::test]
async fn test_concurrency_ceiling_and_single_visit() {
    let wiki = Arc::new(FakeWiki::star(20));
    let coordinator =
        Coordinator::with_transport(create_test_config(), SharedWiki(wiki.clone())).unwrap();
    let pages = coordinator.run("https://wiki.test/").await.unwrap();

    assert_eq!(pages.len(), 21);
    assert!(
        wiki.peak.load(Ordering::SeqCst) <= 5,
        "peak concurrency was {}",
        wiki.peak.load(Ordering::SeqCst)
    );

    let per_url = wiki.per_url.lock().unwrap();
    assert_eq!(per_url.len(), 21);
    assert!(per_url.values().all(|&count| count == 1), "{:?}", per_url);
}

/// Shares a fake wiki between the coordinator and the test body
struct SharedWiki(Arc<FakeWiki>);

impl Transport for SharedWiki {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send + 'a {
        self.0.get(url)
    }
}

#[tokio::test]
async fn test_progress_events_and_phases() {
    let wiki = Arc::new(FakeWiki::star(12));
    let (tx, mut rx) = event_channel();
    let coordinator = Coordinator::with_transport(create_test_config(), SharedWiki(wiki))
        .unwrap()
        .with_events(tx);

    let pages = coordinator.run("https://wiki.test/").await.unwrap();

    let mut phases = Vec::new();
    let mut discovery = Vec::new();
    let mut fetch = Vec::new();
    let mut streamed = 0;
    let mut summary = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            CrawlEvent::PhaseChanged(phase) => phases.push(phase),
            CrawlEvent::Discovery(progress) => discovery.push(progress),
            CrawlEvent::Fetch(progress) => fetch.push(progress),
            CrawlEvent::Page(_) => streamed += 1,
            CrawlEvent::Finished(s) => summary = Some(s),
            CrawlEvent::Failed(message) => panic!("unexpected failure: {}", message),
        }
    }

    assert_eq!(
        phases,
        vec![
            CrawlPhase::Discovering,
            CrawlPhase::Fetching,
            CrawlPhase::Extracting,
            CrawlPhase::Done
        ]
    );

    assert!(discovery.iter().all(|p| p.total > 0 && p.current <= p.total));
    let last = discovery.last().unwrap();
    assert_eq!(last.current, 13);
    assert_eq!(last.total, 13);

    // 13 URLs in batches of 2 × max_concurrent
    assert_eq!(fetch.len(), 2);
    assert_eq!(fetch.last().unwrap().current, 13);

    assert_eq!(streamed, pages.len());
    let summary = summary.expect("no summary event");
    assert_eq!(summary.discovered, 13);
    assert_eq!(summary.scraped, 13);
    assert!(!summary.cancelled);
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let token = CancellationToken::new();
    let mut wiki = FakeWiki::star(30);
    // cancel while the second discovery round is in flight
    wiki.cancel_after = Some((5, token.clone()));
    let wiki = Arc::new(wiki);

    let (tx, mut rx) = event_channel();
    let coordinator = Coordinator::with_transport(create_test_config(), SharedWiki(wiki.clone()))
        .unwrap()
        .with_cancellation(token.clone())
        .with_events(tx);

    let pages = coordinator.run("https://wiki.test/").await.unwrap();

    // root round plus the whole second round, nothing after
    assert_eq!(wiki.calls.load(Ordering::SeqCst), 11);
    assert_eq!(pages.len(), 11);
    assert!(pages.iter().any(|p| p.title == "Root"));

    let mut phases = Vec::new();
    let mut summary = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            CrawlEvent::PhaseChanged(phase) => phases.push(phase),
            CrawlEvent::Finished(s) => summary = Some(s),
            _ => {}
        }
    }
    assert_eq!(phases, vec![CrawlPhase::Discovering, CrawlPhase::Done]);
    assert!(summary.unwrap().cancelled);
}

#[tokio::test]
async fn test_cancellation_during_fetch_phase() {
    let token = CancellationToken::new();
    let mut wiki = FakeWiki::star(30);
    // discovery takes 31 calls (root, then three rounds of 10); the 35th
    // lands in the first fetch batch
    wiki.cancel_after = Some((35, token.clone()));
    let wiki = Arc::new(wiki);

    let config = CrawlConfig {
        reuse_discovery_fetches: false,
        ..create_test_config()
    };
    let (tx, mut rx) = event_channel();
    let coordinator = Coordinator::with_transport(config, SharedWiki(wiki.clone()))
        .unwrap()
        .with_cancellation(token)
        .with_events(tx);

    let pages = coordinator.run("https://wiki.test/").await.unwrap();

    // the fetch batch in flight (2 × max_concurrent) completes, no other starts
    assert_eq!(wiki.calls.load(Ordering::SeqCst), 31 + 10);
    assert_eq!(pages.len(), 10);

    let mut phases = Vec::new();
    let mut fetch = Vec::new();
    let mut streamed = 0;
    let mut summary = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            CrawlEvent::PhaseChanged(phase) => phases.push(phase),
            CrawlEvent::Fetch(progress) => fetch.push(progress),
            CrawlEvent::Page(_) => streamed += 1,
            CrawlEvent::Finished(s) => summary = Some(s),
            _ => {}
        }
    }
    assert_eq!(
        phases,
        vec![CrawlPhase::Discovering, CrawlPhase::Fetching, CrawlPhase::Done]
    );
    assert_eq!(fetch.len(), 1);
    assert_eq!(fetch[0].current, 10);
    assert_eq!(fetch[0].total, 31);
    assert_eq!(streamed, pages.len());

    let summary = summary.expect("no summary event");
    assert!(summary.cancelled);
    assert_eq!(summary.discovered, 31);
    assert_eq!(summary.scraped, 10);
}

#[tokio::test]
async fn test_cancelled_crawl_streams_returned_pages() {
    let token = CancellationToken::new();
    let mut wiki = FakeWiki::star(30);
    wiki.cancel_after = Some((5, token.clone()));

    let (tx, mut rx) = event_channel();
    let coordinator = Coordinator::with_transport(create_test_config(), wiki)
        .unwrap()
        .with_cancellation(token)
        .with_events(tx);

    let pages = coordinator.run("https://wiki.test/").await.unwrap();
    assert!(!pages.is_empty());

    let mut streamed = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::Page(page) = event {
            streamed.push(page);
        }
    }
    assert_eq!(streamed, pages);
}

#[tokio::test]
async fn test_normalized_start_url_is_not_crawled_twice() {
    let pages = HashMap::from([
        (
            "https://wiki.test/docs".to_string(),
            html_page(
                "Docs",
                r##"<a href="/docs/">Self</a><a href="/docs/#top">Top</a><a href="/docs/a/">A</a>"##,
            ),
        ),
        (
            "https://wiki.test/docs/a".to_string(),
            html_page("A", r#"<a href="/docs/">Up</a>"#),
        ),
    ]);
    let wiki = Arc::new(FakeWiki::with_pages(pages));

    let config = CrawlConfig {
        normalize_links: true,
        ..create_test_config()
    };
    let coordinator = Coordinator::with_transport(config, SharedWiki(wiki.clone())).unwrap();
    let pages = coordinator.run("https://wiki.test/docs/").await.unwrap();

    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec!["https://wiki.test/docs", "https://wiki.test/docs/a"]);
    assert_eq!(titles(&pages), vec!["A", "Docs"]);

    let per_url = wiki.per_url.lock().unwrap();
    assert_eq!(per_url.len(), 2, "{:?}", per_url);
    assert!(per_url.values().all(|&count| count == 1), "{:?}", per_url);
}

#[tokio::test]
async fn test_cancel_before_start_returns_empty() {
    let wiki = Arc::new(FakeWiki::star(3));
    let token = CancellationToken::new();
    token.cancel();

    let coordinator = Coordinator::with_transport(create_test_config(), SharedWiki(wiki.clone()))
        .unwrap()
        .with_cancellation(token);

    let pages = coordinator.run("https://wiki.test/").await.unwrap();
    assert!(pages.is_empty());
    assert_eq!(wiki.calls.load(Ordering::SeqCst), 0);
}
