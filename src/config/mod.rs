//! Configuration module for gw2walls
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a file is valid.
//!
//! # Example
//!
//! ```no_run
//! use gw2walls::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gw2walls.toml")).unwrap();
//! println!("Downloading {} wallpapers", config.download.dimension);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DownloadConfig, SiteConfig, UserAgentConfig, DEFAULT_BASE_URL,
    DEFAULT_MEDIA_PATH, DEFAULT_RELEASES_PATH, DEFAULT_TITLE_SUFFIX,
};

// Re-export parser functions
pub use parser::{config_fingerprint, load_config, parse_config};
pub use validation::{validate, MAX_PARALLEL_LIMIT};
