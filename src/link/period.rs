//! Calendar labels derived from page URLs
//!
//! Release pages carry their publication month in the URL, e.g.
//! `/en/the-game/releases/february-2020/` or `/en/the-game/releases/august-27-2019/`.

use chrono::{Datelike, NaiveDate};

/// Date-token formats tried in order; the first successful parse wins
pub const DATE_FORMATS: &[&str] = &["%B-%Y", "%B-%d-%Y"];

/// Derives the `YYYY-MM` period label for a page URL
///
/// Takes the second-to-last `/`-delimited segment of the URL and tries each of
/// [`DATE_FORMATS`] against it. Returns an empty string when no format matches.
///
/// # Example
///
/// ```
/// use gw2walls::link::period_label;
///
/// assert_eq!(period_label("https://example.com/releases/february-2020/"), "2020-02");
/// assert_eq!(period_label("https://example.com/media/wallpapers/"), "");
/// ```
pub fn period_label(page_url: &str) -> String {
    let segments: Vec<&str> = page_url.split('/').collect();
    if segments.len() < 2 {
        return String::new();
    }

    let token = segments[segments.len() - 2];
    parse_date_token(token)
        .map(|date| format!("{:04}-{:02}", date.year(), date.month()))
        .unwrap_or_default()
}

/// Parses a date token against the known formats
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if token.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|format| {
        if format.contains("%d") {
            NaiveDate::parse_from_str(token, format).ok()
        } else {
            // Month-only tokens have no day; pin them to the first.
            NaiveDate::parse_from_str(&format!("01-{}", token), &format!("%d-{}", format)).ok()
        }
    })
}
