//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use image_harvester::config::Config;
use image_harvester::crawler::{CrawlSummary, Crawler};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded with a single URL
fn create_test_config(seed: &str) -> Config {
    let mut config = Config::new("cat");
    config.crawler.seeds = vec![seed.to_string()];
    config.crawler.max_pages = 50;
    config.crawler.max_depth = 3;
    config.crawler.concurrency = 4;
    config.crawler.timeout_secs = 5;
    config.crawler.rate_limit_ms = 0;
    config
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

/// Mounts an HTML page that must be requested exactly `times` times
async fn mount_page(server: &MockServer, page: &str, body: impl Into<String>, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Runs a crawl, failing the test if it does not finish in time
async fn run_crawl(config: Config) -> (CrawlSummary, Vec<String>) {
    let crawler = Crawler::new(config)
        .expect("Failed to build crawler")
        .with_progress(false);

    let summary = tokio::time::timeout(Duration::from_secs(30), crawler.start())
        .await
        .expect("Crawl did not terminate")
        .expect("Crawl failed");

    (summary, crawler.image_urls())
}

#[tokio::test]
async fn test_end_to_end_collects_distinct_keyword_images() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body>
            <img src="/images/cat.jpg">
            <img src="/images/cat.jpg?w=640&q=80">
            <img src="/images/cat.webp">
            <img src="/images/dog.jpg">
        </body></html>"#,
        1,
    )
    .await;

    let (summary, images) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    assert_eq!(images, vec![format!("{}/images/cat.jpg", base_url)]);
    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.images_found, 1);
    assert_eq!(summary.fetch_failures, 0);
}

#[tokio::test]
async fn test_page_reached_by_two_links_is_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r##"<a href="/a">A</a><a href="/a#section">A again</a><a href="/b">B</a>"##,
        1,
    )
    .await;
    mount_page(&mock_server, "/a", "<p>a</p>", 1).await;
    mount_page(
        &mock_server,
        "/b",
        r#"<a href="/a">A</a><a href="/">Home</a>"#,
        1,
    )
    .await;

    let (summary, _) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    assert_eq!(summary.pages_crawled, 3);
    // Mock expectations verify each page was requested exactly once
}

#[tokio::test]
async fn test_max_pages_with_queue_smaller_than_link_count() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..200)
        .map(|i| format!(r#"<a href="/p{}">page {}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", links, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html(r#"<img src="/cat.png">"#))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawler.max_pages = 5;
    config.crawler.queue_capacity = Some(4);
    config.crawler.concurrency = 2;

    let (summary, images) = run_crawl(config).await;

    assert_eq!(summary.pages_crawled, 5);
    assert_eq!(images, vec![format!("{}/cat.png", base_url)]);
}

#[tokio::test]
async fn test_robots_blocked_page_does_not_hold_budget() {
    let blocked_server = MockServer::start().await;
    let open_server = MockServer::start().await;

    // The slow robots.txt keeps one worker busy while the others claim slots
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&blocked_server)
        .await;
    mount_page(&blocked_server, "/page", r#"<img src="/cat.jpg">"#, 0).await;
    mount_page(&open_server, "/one", "<p>one</p>", 1).await;
    mount_page(&open_server, "/two", "<p>two</p>", 1).await;

    let mut config = create_test_config(&format!("{}/page", blocked_server.uri()));
    config.crawler.seeds.push(format!("{}/one", open_server.uri()));
    config.crawler.seeds.push(format!("{}/two", open_server.uri()));
    config.crawler.max_pages = 2;
    config.crawler.concurrency = 3;

    let (summary, images) = run_crawl(config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_max_depth_stops_link_following() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/level1">1</a>"#, 1).await;
    mount_page(
        &mock_server,
        "/level1",
        r#"<img src="/cat-deep.jpg"><a href="/level2">2</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/level2", "<p>too deep</p>", 0).await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawler.max_depth = 1;

    let (summary, images) = run_crawl(config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(images, vec![format!("{}/cat-deep.jpg", base_url)]);
}

#[tokio::test]
async fn test_robots_disallow_is_honored() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/private/cats">private</a><a href="/public">public</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/private/cats", r#"<img src="/cat.jpg">"#, 0).await;
    mount_page(&mock_server, "/public", "<p>public</p>", 1).await;

    let (summary, images) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    assert_eq!(summary.pages_crawled, 2);
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_ignore_robots_skips_robots_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/", r#"<a href="/private/cats">private</a>"#, 1).await;
    mount_page(&mock_server, "/private/cats", r#"<img src="/cat.jpg">"#, 1).await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawler.ignore_robots = true;

    let (summary, images) = run_crawl(config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(images, vec![format!("{}/cat.jpg", base_url)]);
}

#[tokio::test]
async fn test_status_codes_and_failure_counting() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/forbidden">403</a><a href="/missing">404</a><a href="/broken">500</a><a href="/ok">ok</a>"#,
        1,
    )
    .await;

    for (page, status) in [("/forbidden", 403), ("/missing", 404), ("/broken", 500)] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    mount_page(&mock_server, "/ok", "<p>ok</p>", 1).await;

    let (summary, _) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    // Every page counts as crawled; only 404 and 500 count as failures
    assert_eq!(summary.pages_crawled, 5);
    assert_eq!(summary.fetch_failures, 2);
}

#[tokio::test]
async fn test_non_html_response_is_not_parsed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/feed">feed</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"html": "<img src='/cat.jpg'>"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (summary, images) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.fetch_failures, 0);
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_images_from_every_source_and_image_links_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head>
            <meta property="og:image" content="https://cdn.example.com/og-cat.jpg">
        </head><body>
            <img data-src="/lazy-cat.gif" src="/placeholder.gif">
            <img src="/small-cat.jpg" srcset="/cat-320.jpg 320w, /cat-1280.jpg 1280w">
            <picture><source srcset="/pic-cat-480.png 480w, /pic-cat-1200.png 1200w"></picture>
            <a href="/full/cat-large.png">full size</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/full/cat-large.png", "", 0).await;

    let (summary, images) = run_crawl(create_test_config(&format!("{}/", base_url))).await;

    let expected = [
        format!("{}/lazy-cat.gif", base_url),
        format!("{}/small-cat.jpg", base_url),
        format!("{}/cat-1280.jpg", base_url),
        format!("{}/full/cat-large.png", base_url),
        format!("{}/pic-cat-1200.png", base_url),
        "https://cdn.example.com/og-cat.jpg".to_string(),
    ];
    assert_eq!(images, expected);
    assert_eq!(summary.pages_crawled, 1);
}

#[tokio::test]
async fn test_skip_thumbnails_option() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<img src="/thumb/cat.jpg"><img src="/cat_small.jpg"><img src="/cat.jpg">"#,
        ))
        .mount(&mock_server)
        .await;

    let (_, all_images) = run_crawl(create_test_config(&format!("{}/", base_url))).await;
    assert_eq!(all_images.len(), 3);

    let mut config = create_test_config(&format!("{}/", base_url));
    config.crawler.skip_thumbnails = true;
    let (_, images) = run_crawl(config).await;
    assert_eq!(images, vec![format!("{}/cat.jpg", base_url)]);
}

#[tokio::test]
async fn test_other_hosts_are_not_followed() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Ports are ignored when comparing domains, so the link names a different host
    mount_page(
        &mock_server,
        "/",
        &format!(r#"<a href="{}/away">away</a>"#, other_server.uri().replace("127.0.0.1", "localhost")),
        1,
    )
    .await;
    mount_page(&other_server, "/away", "<p>away</p>", 0).await;

    let (summary, _) = run_crawl(create_test_config(&format!("{}/", base_url))).await;
    assert_eq!(summary.pages_crawled, 1);
}
