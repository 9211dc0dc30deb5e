//! URL handling module for gw2walls
//!
//! This module resolves the hrefs found on wallpaper pages: child page links
//! against the site origin, and asset links (often protocol-relative) into
//! absolute download URLs.

mod normalize;

pub use normalize::{normalize_asset_url, parse_site_origin, resolve_page_url};

use ::url::Url;

/// Joins a path such as `/en/media/wallpapers/` onto the site origin
///
/// # Examples
///
/// ```
/// use gw2walls::url::{entry_url, parse_site_origin};
///
/// let origin = parse_site_origin("https://www.guildwars2.com").unwrap();
/// let media = entry_url(&origin, "/en/media/wallpapers/").unwrap();
/// assert_eq!(media.as_str(), "https://www.guildwars2.com/en/media/wallpapers/");
/// ```
pub fn entry_url(origin: &Url, path: &str) -> crate::UrlResult<Url> {
    resolve_page_url(path, origin)
}

/// Returns the last path segment of a URL or path, ignoring query and fragment
pub fn last_path_segment(raw: &str) -> &str {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    without_query.rsplit('/').next().unwrap_or_default()
}
