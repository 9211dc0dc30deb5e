use crate::UrlError;
use url::Url;

/// Parses and validates the site origin every relative link is resolved against
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host
/// 4. Drop path, query and fragment so only the origin remains
///
/// # Examples
///
/// ```
/// use gw2walls::url::parse_site_origin;
///
/// let origin = parse_site_origin("https://www.guildwars2.com/en/").unwrap();
/// assert_eq!(origin.as_str(), "https://www.guildwars2.com/");
/// ```
pub fn parse_site_origin(base: &str) -> Result<Url, UrlError> {
    let mut url = parse_http_url(base)?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Resolves a child page href against the site origin
///
/// Absolute HTTP(S) hrefs are kept; relative ones are joined onto `origin`.
///
/// # Examples
///
/// ```
/// use gw2walls::url::{parse_site_origin, resolve_page_url};
///
/// let origin = parse_site_origin("https://www.guildwars2.com").unwrap();
/// let page = resolve_page_url("/en/the-game/releases/february-2020/", &origin).unwrap();
/// assert_eq!(page.as_str(), "https://www.guildwars2.com/en/the-game/releases/february-2020/");
/// ```
pub fn resolve_page_url(href: &str, origin: &Url) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    let resolved = origin
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    check_http_scheme(&resolved)?;
    Ok(resolved)
}

/// Normalizes an asset href into an absolute URL string
///
/// Protocol-relative hrefs (`//cdn.example.com/a.jpg`) gain an `https:` scheme,
/// absolute hrefs are kept, anything else is joined onto `origin`.
///
/// # Examples
///
/// ```
/// use gw2walls::url::{normalize_asset_url, parse_site_origin};
///
/// let origin = parse_site_origin("https://www.guildwars2.com").unwrap();
/// let asset = normalize_asset_url("//d3b4yo2b5lbfy.cloudfront.net/wp/a.jpg", &origin).unwrap();
/// assert_eq!(asset, "https://d3b4yo2b5lbfy.cloudfront.net/wp/a.jpg");
/// ```
pub fn normalize_asset_url(href: &str, origin: &Url) -> Result<String, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    if let Some(rest) = href.strip_prefix("//") {
        let absolute = format!("https://{}", rest);
        parse_http_url(&absolute)?;
        return Ok(absolute);
    }

    resolve_page_url(href, origin).map(|url| url.to_string())
}

/// Parses a URL and requires an HTTP(S) scheme and a host
fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    check_http_scheme(&url)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

fn check_http_scheme(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }
    Ok(())
}
