use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default site the wallpapers are harvested from
pub const DEFAULT_BASE_URL: &str = "https://www.guildwars2.com";

/// Default path of the releases index page
pub const DEFAULT_RELEASES_PATH: &str = "/en/the-game/releases/";

/// Default path of the media wallpapers page
pub const DEFAULT_MEDIA_PATH: &str = "/en/media/wallpapers/";

/// Site name appended to every page title
pub const DEFAULT_TITLE_SUFFIX: &str = " | GuildWars2.com";

/// Main configuration structure for gw2walls
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Where the entry pages live and how their titles are shaped
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin every relative page link is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the releases index page
    #[serde(rename = "releases-path")]
    pub releases_path: String,

    /// Path of the media wallpapers page
    #[serde(rename = "media-path")]
    pub media_path: String,

    /// Suffix stripped from page titles to form the collection label
    #[serde(rename = "title-suffix")]
    pub title_suffix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            releases_path: DEFAULT_RELEASES_PATH.to_string(),
            media_path: DEFAULT_MEDIA_PATH.to_string(),
            title_suffix: DEFAULT_TITLE_SUFFIX.to_string(),
        }
    }
}

/// Download stage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Variant key to retrieve, e.g. `1920x1080`
    pub dimension: String,

    /// Directory the wallpapers are written to
    #[serde(rename = "output-path")]
    pub output_path: PathBuf,

    /// Maximum number of concurrent downloads
    #[serde(rename = "max-parallel")]
    pub max_parallel: usize,

    /// Overwrite files that already exist instead of skipping them
    #[serde(rename = "overwrite-existing")]
    pub overwrite_existing: bool,

    /// Append a short digest of the source URL to every file name
    #[serde(rename = "disambiguate-names")]
    pub disambiguate_names: bool,

    /// Capacity of the channel between discovery and download
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dimension: "1920x1080".to_string(),
            output_path: PathBuf::from("gw2_walls"),
            max_parallel: 4,
            overwrite_existing: true,
            disambiguate_names: false,
            queue_capacity: 200,
        }
    }
}

/// Discovery stage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Do not scan the media wallpapers page
    #[serde(rename = "skip-media")]
    pub skip_media: bool,

    /// Do not scan the releases index page
    #[serde(rename = "skip-releases")]
    pub skip_releases: bool,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            skip_media: false,
            skip_releases: false,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    pub name: String,

    /// Version sent in the User-Agent header
    pub version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "gw2walls".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}
