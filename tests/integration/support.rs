//! Shared fixtures: an in-memory site and HTML builders

use async_trait::async_trait;
use gw2walls::config::Config;
use gw2walls::{FetchError, Fetcher};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const SITE: &str = "https://site.test";

/// In-memory fetcher with injectable delays and failures
///
/// Assets are served as their own URL bytes. Concurrent asset fetches are
/// counted so tests can check the download ceiling.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, (String, Duration)>,
    failing_assets: HashSet<String>,
    asset_delay: Duration,
    asset_requests: Mutex<Vec<String>>,
    active_assets: AtomicUsize,
    max_active_assets: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: String) -> Self {
        self.slow_page(url, body, Duration::ZERO)
    }

    pub fn slow_page(mut self, url: &str, body: String, delay: Duration) -> Self {
        self.pages.insert(url.to_string(), (body, delay));
        self
    }

    pub fn failing_asset(mut self, url: &str) -> Self {
        self.failing_assets.insert(url.to_string());
        self
    }

    pub fn asset_delay(mut self, delay: Duration) -> Self {
        self.asset_delay = delay;
        self
    }

    pub fn asset_requests(&self) -> Vec<String> {
        self.asset_requests.lock().unwrap().clone()
    }

    pub fn max_active_assets(&self) -> usize {
        self.max_active_assets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let (body, delay) = self.pages.get(url).cloned().ok_or(FetchError::NotFound {
            url: url.to_string(),
        })?;
        tokio::time::sleep(delay).await;
        Ok(body)
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.asset_requests.lock().unwrap().push(url.to_string());

        let now = self.active_assets.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_assets.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.asset_delay).await;
        self.active_assets.fetch_sub(1, Ordering::SeqCst);

        if self.failing_assets.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        Ok(url.as_bytes().to_vec())
    }
}

/// Configuration pointing at `base_url`, writing into `output`
pub fn test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.site.releases_path = "/releases/".to_string();
    config.site.media_path = "/media/".to_string();
    config.site.title_suffix = " | Site".to_string();
    config.download.output_path = output.to_path_buf();
    config.download.dimension = "1920x1080".to_string();
    config.download.max_parallel = 2;
    config.download.queue_capacity = 16;
    config
}

/// A releases index linking to `children`
pub fn index_page(children: &[&str]) -> String {
    let items: String = children
        .iter()
        .map(|href| format!(r#"<li><a href="{}">release</a></li>"#, href))
        .collect();
    format!(
        r#"<html><head><title>Releases | Site</title></head><body>
        <section class="release-canvas"><ul>{}</ul></section>
        </body></html>"#,
        items
    )
}

/// A release page with one `ul.wallpaper` item per entry of `items`
///
/// Each item is a list of `(href, variant)` pairs.
pub fn release_page(title: &str, items: &[Vec<(String, &str)>]) -> String {
    let lists: String = items
        .iter()
        .map(|links| {
            let anchors: String = links
                .iter()
                .map(|(href, variant)| format!(r#"<li><a href="{}">{}</a></li>"#, href, variant))
                .collect();
            format!(r#"<ul class="wallpaper">{}</ul>"#, anchors)
        })
        .collect();
    format!(
        r#"<html><head><title>{} | Site</title></head><body>{}</body></html>"#,
        title, lists
    )
}

/// A media page with one `li.wallpaper` item per `(image src, href, variant)`
pub fn media_page(items: &[(&str, String, &str)]) -> String {
    let entries: String = items
        .iter()
        .map(|(img, href, variant)| {
            format!(
                r#"<li class="wallpaper"><img src="{}"><a href="{}">{}</a></li>"#,
                img, href, variant
            )
        })
        .collect();
    format!(
        r#"<html><head><title>Wallpapers | Site</title></head><body><ul>{}</ul></body></html>"#,
        entries
    )
}

/// Sorted file names in `dir`
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
