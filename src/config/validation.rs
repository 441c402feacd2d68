use crate::config::types::CrawlConfig;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_limits(config)?;
    validate_batches(config)?;
    if let Some(root) = &config.site_root {
        validate_site_root(root)?;
    }
    Ok(())
}

/// Validates concurrency and timeout settings
fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout_seconds must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates batch sizes
fn validate_batches(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.discovery_batch_size == 0 {
        return Err(ConfigError::Validation(
            "discovery_batch_size must be >= 1".to_string(),
        ));
    }

    if config.fetch_batch_size == Some(0) {
        return Err(ConfigError::Validation(
            "fetch_batch_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the same-site prefix
fn validate_site_root(root: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site_root '{}': {}", root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "site_root '{}' must use http or https",
            root
        )));
    }

    Ok(())
}
