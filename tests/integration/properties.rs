//! Concurrency properties of the pipeline, driven by an in-memory site

use crate::support::{files_in, index_page, media_page, release_page, test_config, FakeSite, SITE};
use gw2walls::download::{Retriever, RetrieverOptions};
use gw2walls::pipeline::run_pipeline;
use gw2walls::LinkRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn asset(name: &str) -> String {
    format!("https://cdn.test/{}.jpg", name)
}

#[tokio::test]
async fn test_discovery_waits_for_delayed_child_pages() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(SITE, dir.path());
    config.crawler.skip_media = true;

    let site = FakeSite::new()
        .page(
            "https://site.test/releases/",
            index_page(&["/releases/june-2019/", "/releases/may-2019/"]),
        )
        .slow_page(
            "https://site.test/releases/june-2019/",
            release_page("Slow", &[vec![(asset("slow"), "1920x1080")]]),
            Duration::from_millis(300),
        )
        .page(
            "https://site.test/releases/may-2019/",
            release_page("Fast", &[vec![(asset("fast"), "1920x1080")]]),
        );

    let started = Instant::now();
    let report = run_pipeline(&config, Arc::new(site), CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(report.crawl.pages_scanned, 3);
    assert_eq!(report.download.downloaded, 2);
    assert_eq!(
        files_in(dir.path()),
        vec!["2019-05 Fast 1 1920x1080.jpg", "2019-06 Slow 1 1920x1080.jpg"]
    );
}

#[tokio::test]
async fn test_download_ceiling_is_never_exceeded() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(SITE, dir.path());
    config.crawler.skip_releases = true;
    config.download.max_parallel = 3;

    let items: Vec<(&str, String, &str)> = (0..12)
        .map(|i| ("/img/thumb-crop.jpg", asset(&format!("m{}", i)), "1920x1080"))
        .collect();
    let site = Arc::new(
        FakeSite::new()
            .page("https://site.test/media/", media_page(&items))
            .asset_delay(Duration::from_millis(40)),
    );

    let report = run_pipeline(&config, site.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.download.downloaded, 12);
    assert!(site.max_active_assets() <= 3);
    assert!(report.download.peak_in_flight <= 3);
    assert!(report.download.peak_in_flight >= 1);
    assert_eq!(files_in(dir.path()).len(), 12);
}

#[tokio::test]
async fn test_buffered_links_are_delivered_after_close() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = mpsc::channel(16);
    for i in 1..=10 {
        let record =
            LinkRecord::new(asset(&format!("b{}", i)), "Buffered", "1920x1080", "", i).unwrap();
        tx.send(record).await.unwrap();
    }
    drop(tx);

    let retriever = Retriever::new(
        Arc::new(FakeSite::new()),
        RetrieverOptions {
            output_dir: dir.path().to_path_buf(),
            variant: "1920x1080".to_string(),
            max_parallel: 2,
            overwrite_existing: true,
            disambiguate_names: false,
        },
        CancellationToken::new(),
    );

    let report = retriever.start(rx).wait().await;
    assert_eq!(report.received, 10);
    assert_eq!(report.downloaded, 10);
    assert_eq!(files_in(dir.path()).len(), 10);
}

#[tokio::test]
async fn test_other_variants_are_never_fetched() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(SITE, dir.path());
    config.crawler.skip_media = true;

    let site = Arc::new(
        FakeSite::new()
            .page(
                "https://site.test/releases/",
                index_page(&["/releases/august-2020/"]),
            )
            .page(
                "https://site.test/releases/august-2020/",
                release_page(
                    "Variants",
                    &[
                        vec![
                            (asset("a-small"), "1920x1080"),
                            (asset("a-large"), "2560x1440"),
                        ],
                        vec![(asset("b-large"), "2560x1440")],
                    ],
                ),
            ),
    );

    let report = run_pipeline(&config, site.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.download.received, 3);
    assert_eq!(report.download.filtered, 2);
    assert_eq!(site.asset_requests(), vec![asset("a-small")]);
    assert_eq!(
        files_in(dir.path()),
        vec!["2020-08 Variants 1 1920x1080.jpg"]
    );
}

#[tokio::test]
async fn test_cancellation_ends_the_run() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(SITE, dir.path());
    config.crawler.skip_media = true;

    let site = FakeSite::new()
        .page(
            "https://site.test/releases/",
            index_page(&["/releases/march-2021/"]),
        )
        .slow_page(
            "https://site.test/releases/march-2021/",
            release_page("Never", &[vec![(asset("never"), "1920x1080")]]),
            Duration::from_secs(30),
        );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        run_pipeline(&config, Arc::new(site), cancel),
    )
    .await
    .expect("cancelled run should finish promptly")
    .unwrap();

    assert_eq!(report.download.downloaded, 0);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_failed_asset_is_isolated() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(SITE, dir.path());
    config.crawler.skip_media = true;

    let items: Vec<Vec<(String, &str)>> = ["first", "broken", "last"]
        .iter()
        .map(|name| vec![(asset(name), "1920x1080")])
        .collect();
    let site = Arc::new(
        FakeSite::new()
            .page(
                "https://site.test/releases/",
                index_page(&["/releases/october-2023/"]),
            )
            .page(
                "https://site.test/releases/october-2023/",
                release_page("Mixed", &items),
            )
            .failing_asset(&asset("broken")),
    );

    let report = run_pipeline(&config, site.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.download.downloaded, 2);
    assert_eq!(report.download.failed, 1);
    assert_eq!(report.download.failures[0].url, asset("broken"));
    assert_eq!(site.asset_requests().len(), 3);
    assert_eq!(
        files_in(dir.path()),
        vec!["2023-10 Mixed 1 1920x1080.jpg", "2023-10 Mixed 3 1920x1080.jpg"]
    );
}
