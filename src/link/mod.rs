//! Discovered wallpaper links
//!
//! This module defines the record that travels from discovery to download and
//! the label derivations (file names, calendar periods) built on top of it.

mod period;
mod record;

pub use period::{parse_date_token, period_label, DATE_FORMATS};
pub use record::{sanitize_name, LinkRecord, DEFAULT_EXTENSION};
