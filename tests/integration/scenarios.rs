//! End-to-end runs over HTTP against a mock site

use crate::support::{files_in, index_page, media_page, release_page, test_config};
use gw2walls::config::Config;
use gw2walls::crawler::HttpFetcher;
use gw2walls::pipeline::{run_pipeline, RunReport};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn serve_asset(server: &MockServer, route: &str, status: u16, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(route.as_bytes().to_vec()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, output: &Path) -> Config {
    test_config(&server.uri(), output)
}

async fn run(config: &Config) -> RunReport {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler).unwrap();
    run_pipeline(config, Arc::new(fetcher), CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_release_page_downloads_only_requested_dimension() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, dir.path());
    config.crawler.skip_media = true;

    let small = format!("{}/assets/bound-1920.jpg", server.uri());
    let large = format!("{}/assets/bound-2560.jpg", server.uri());

    serve_page(&server, "/releases/", index_page(&["/releases/june-2019/"])).await;
    serve_page(
        &server,
        "/releases/june-2019/",
        release_page("Bound", &[vec![(small, "1920x1080"), (large, "2560x1440")]]),
    )
    .await;
    serve_asset(&server, "/assets/bound-1920.jpg", 200, 1).await;
    serve_asset(&server, "/assets/bound-2560.jpg", 200, 0).await;

    let report = run(&config).await;

    assert_eq!(report.download.downloaded, 1);
    assert_eq!(report.download.filtered, 1);
    assert_eq!(files_in(dir.path()), vec!["2019-06 Bound 1 1920x1080.jpg"]);
    assert_eq!(
        std::fs::read(dir.path().join("2019-06 Bound 1 1920x1080.jpg")).unwrap(),
        b"/assets/bound-1920.jpg"
    );
}

#[tokio::test]
async fn test_media_items_get_distinct_files() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, dir.path());
    config.crawler.skip_releases = true;

    let first = format!("{}/assets/first.jpg", server.uri());
    let second = format!("{}/assets/second.jpg", server.uri());

    serve_page(
        &server,
        "/media/",
        media_page(&[
            ("/img/charr-crop.jpg", first, "1920x1080"),
            ("/img/charr-crop.jpg", second, "1920x1080"),
        ]),
    )
    .await;
    serve_asset(&server, "/assets/first.jpg", 200, 1).await;
    serve_asset(&server, "/assets/second.jpg", 200, 1).await;

    let report = run(&config).await;

    assert_eq!(report.download.downloaded, 2);
    assert_eq!(
        files_in(dir.path()),
        vec!["charr 1 1920x1080.jpg", "charr 2 1920x1080.jpg"]
    );
}

#[tokio::test]
async fn test_undated_release_page_is_still_downloaded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, dir.path());
    config.crawler.skip_media = true;

    let wallpaper = format!("{}/assets/festival.jpg", server.uri());

    serve_page(
        &server,
        "/releases/",
        index_page(&["/releases/festival-of-the-four-winds/"]),
    )
    .await;
    serve_page(
        &server,
        "/releases/festival-of-the-four-winds/",
        release_page("Festival", &[vec![(wallpaper, "1920x1080")]]),
    )
    .await;
    serve_asset(&server, "/assets/festival.jpg", 200, 1).await;

    let report = run(&config).await;

    assert_eq!(report.download.downloaded, 1);
    assert_eq!(files_in(dir.path()), vec!["Festival 1 1920x1080.jpg"]);
}

#[tokio::test]
async fn test_failed_asset_does_not_stop_the_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, dir.path());
    config.crawler.skip_media = true;

    let items: Vec<Vec<(String, &str)>> = ["one", "two", "three"]
        .iter()
        .map(|name| vec![(format!("{}/assets/{}.jpg", server.uri(), name), "1920x1080")])
        .collect();

    serve_page(&server, "/releases/", index_page(&["/releases/may-2022/"])).await;
    serve_page(&server, "/releases/may-2022/", release_page("Trio", &items)).await;
    serve_asset(&server, "/assets/one.jpg", 200, 1).await;
    serve_asset(&server, "/assets/two.jpg", 500, 1).await;
    serve_asset(&server, "/assets/three.jpg", 200, 1).await;

    let report = run(&config).await;

    assert_eq!(report.download.downloaded, 2);
    assert_eq!(report.download.failed, 1);
    assert!(report.download.failures[0].url.ends_with("/assets/two.jpg"));
    assert!(!report.is_success());
    assert_eq!(
        files_in(dir.path()),
        vec!["2022-05 Trio 1 1920x1080.jpg", "2022-05 Trio 3 1920x1080.jpg"]
    );
}

#[tokio::test]
async fn test_missing_entry_page_is_not_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path());

    let report = run(&config).await;

    assert_eq!(report.crawl.pages_failed, 2);
    assert_eq!(report.download.received, 0);
    assert!(report.is_success());
    assert!(files_in(dir.path()).is_empty());
}
