//! Wallpaper page extractor
//!
//! Turns one fetched page into the wallpaper links it lists and the child pages
//! worth scanning next. Four page shapes are recognized:
//!
//! | Selector | Yields |
//! |----------|--------|
//! | `li.wallpaper` | media wallpapers, labelled by image filename |
//! | `ul.wallpaper` | release wallpapers, labelled by page title |
//! | `ul.resolution` | release wallpapers, labelled by page title |
//! | `section.release-canvas li a` | child release pages |
//!
//! Listing shapes are scanned in the order above, each in document order. Every
//! matched listing item takes the next sequence number once, however many size
//! links it holds, so reruns of the same page produce the same file names.

use crate::link::{period_label, LinkRecord};
use crate::url::{last_path_segment, normalize_asset_url, resolve_page_url};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Collection label used for media wallpapers without an image
pub const MEDIA_LABEL: &str = "Media";

/// Suffix stripped from media image filenames
pub const CROP_SUFFIX: &str = "-crop.jpg";

const TITLE: &str = "title";
const MEDIA_ITEM: &str = "li.wallpaper";
const RELEASE_ITEM: &str = "ul.wallpaper";
const RESOLUTION_ITEM: &str = "ul.resolution";
const RELEASE_INDEX_ITEM: &str = "section.release-canvas li";

/// Everything one page scan produced
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    /// Page title with the site suffix removed
    pub title: Option<String>,

    /// `YYYY-MM` label derived from the page URL, empty if undated
    pub period_label: String,

    /// Wallpaper links in discovery order
    pub links: Vec<LinkRecord>,

    /// Child pages to scan next
    pub children: Vec<Url>,

    /// Number of listing items matched (the last sequence number used)
    pub items: u32,

    /// Hrefs that could not be turned into absolute URLs
    pub rejected_hrefs: Vec<String>,
}

/// Extracts wallpaper links and child pages from page bodies
#[derive(Debug, Clone)]
pub struct Extractor {
    origin: Url,
    title_suffix: String,
}

impl Extractor {
    /// Creates an extractor resolving relative links against `origin`
    pub fn new(origin: Url, title_suffix: impl Into<String>) -> Self {
        Self {
            origin,
            title_suffix: title_suffix.into(),
        }
    }

    /// Origin relative links are resolved against
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Scans one page body
    ///
    /// # Arguments
    ///
    /// * `html` - The page body
    /// * `page_url` - The URL the body was fetched from (source of the period label)
    ///
    /// # Example
    ///
    /// ```
    /// use gw2walls::crawler::Extractor;
    /// use url::Url;
    ///
    /// let extractor = Extractor::new(Url::parse("https://example.com").unwrap(), " | Example");
    /// let html = r#"<html><head><title>Ice | Example</title></head><body>
    ///     <ul class="wallpaper"><li><a href="//cdn.example.com/a.jpg">1920x1080</a></li></ul>
    /// </body></html>"#;
    /// let scan = extractor.scan(html, "https://example.com/releases/june-2019/");
    /// assert_eq!(scan.links.len(), 1);
    /// assert_eq!(scan.links[0].display_name(), "2019-06 Ice 1 1920x1080");
    /// ```
    pub fn scan(&self, html: &str, page_url: &str) -> PageScan {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let title = extract_title(root).map(|t| self.strip_title_suffix(&t));
        let collection = title.clone().unwrap_or_default();
        let period = period_label(page_url);

        let mut scan = PageScan {
            title,
            period_label: period.clone(),
            ..PageScan::default()
        };

        for item in select(root, MEDIA_ITEM) {
            scan.items += 1;
            let label = media_label(item);
            self.collect_variants(item, &label, "", &mut scan);
        }

        for shape in [RELEASE_ITEM, RESOLUTION_ITEM] {
            for item in select(root, shape) {
                scan.items += 1;
                self.collect_variants(item, &collection, &period, &mut scan);
            }
        }

        for item in select(root, RELEASE_INDEX_ITEM) {
            for anchor in select(item, "a") {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                match resolve_page_url(href, &self.origin) {
                    Ok(child) => scan.children.push(child),
                    Err(e) => {
                        tracing::debug!(page = page_url, href, "Skipping release link: {}", e);
                        scan.rejected_hrefs.push(href.to_string());
                    }
                }
            }
        }

        scan
    }

    /// Emits one record per size link inside a listing item
    fn collect_variants(
        &self,
        item: ElementRef<'_>,
        collection: &str,
        period: &str,
        scan: &mut PageScan,
    ) {
        for anchor in select(item, "a") {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            let source_url = match normalize_asset_url(href, &self.origin) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(href, "Skipping wallpaper link: {}", e);
                    scan.rejected_hrefs.push(href.to_string());
                    continue;
                }
            };

            let variant = element_text(anchor);
            if let Some(record) = LinkRecord::new(source_url, collection, variant, period, scan.items)
            {
                tracing::trace!("Found {}", record);
                scan.links.push(record);
            }
        }
    }

    /// Removes the first occurrence of the site suffix from a title
    fn strip_title_suffix(&self, title: &str) -> String {
        if self.title_suffix.is_empty() {
            return title.trim().to_string();
        }
        title.replacen(&self.title_suffix, "", 1).trim().to_string()
    }
}

/// Collection label for a media item: its image filename minus the crop suffix
fn media_label(item: ElementRef<'_>) -> String {
    select(item, "img")
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .map(|src| last_path_segment(src).replacen(CROP_SUFFIX, "", 1))
        .filter(|label| !label.trim().is_empty())
        .last()
        .unwrap_or_else(|| MEDIA_LABEL.to_string())
}

/// Extracts the page title from the HTML document
fn extract_title(root: ElementRef<'_>) -> Option<String> {
    select(root, TITLE)
        .into_iter()
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Collected, trimmed text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Selects descendants of `scope` matching `css`
fn select<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}
