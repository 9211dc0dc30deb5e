use crate::config::types::{Config, CrawlerConfig, DownloadConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the download parallelism ceiling
pub const MAX_PARALLEL_LIMIT: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_download_config(&config.download)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    validate_page_path("releases-path", &config.releases_path)?;
    validate_page_path("media-path", &config.media_path)?;

    Ok(())
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.dimension.trim().is_empty() {
        return Err(ConfigError::Validation(
            "dimension cannot be empty".to_string(),
        ));
    }

    if config.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-path cannot be empty".to_string(),
        ));
    }

    if config.max_parallel < 1 || config.max_parallel > MAX_PARALLEL_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-parallel must be between 1 and {}, got {}",
            MAX_PARALLEL_LIMIT, config.max_parallel
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue-capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, '-' and '_', got '{}'",
            config.name
        )));
    }

    Ok(())
}

/// Validates an entry page path
fn validate_page_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            field, path
        )));
    }

    Ok(())
}
