use crate::config::types::{Config, CrawlerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_keyword(&config.keyword)?;
    validate_crawler_config(&config.crawler)?;
    validate_seeds(&config.crawler)?;
    Ok(())
}

fn validate_keyword(keyword: &str) -> Result<(), ConfigError> {
    if keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "keyword cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates crawler bounds
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1".to_string(),
        ));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max-depth must be at least 1".to_string(),
        ));
    }

    if config.concurrency < 1 {
        return Err(ConfigError::Validation(
            "concurrency must be at least 1".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.queue_capacity == Some(0) {
        return Err(ConfigError::Validation(
            "queue-capacity must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs and makes sure at least one seed source exists
fn validate_seeds(config: &CrawlerConfig) -> Result<(), ConfigError> {
    for seed in &config.seeds {
        let url = Url::parse(seed.trim()).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid seed URL (must start with http:// or https://): {}",
                seed
            )));
        }
    }

    if config.seeds.is_empty() && config.sites.is_empty() {
        return Err(ConfigError::Validation(
            "no seed URLs or default sites provided".to_string(),
        ));
    }

    Ok(())
}
