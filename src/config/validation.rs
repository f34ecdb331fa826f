use crate::config::types::{ClientConfig, Config, DiscoveryConfig, OutputConfig};
use crate::url::{is_http_url, is_valid_domain_pattern};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_name(&config.name)?;
    validate_entry_urls(&config.entry_urls)?;
    validate_client_config(&config.client)?;
    validate_discovery_config(&config.discovery)?;
    validate_output_config(&config.output)?;
    validate_extract_selectors(&config.extract)?;
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation("name cannot be empty".to_string()));
    }
    Ok(())
}

/// Validates that every entry URL is an absolute http(s) URL
fn validate_entry_urls(urls: &[String]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::Validation(
            "entry-urls must contain at least one URL".to_string(),
        ));
    }

    for entry in urls {
        Url::parse(entry)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid entry URL '{}': {}", entry, e)))?;

        if !is_http_url(entry) {
            return Err(ConfigError::InvalidUrl(format!(
                "Entry URL '{}' must be an http(s) URL with a host",
                entry
            )));
        }
    }

    Ok(())
}

/// Validates fetch client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.concurrent_requests < 1 || config.concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrent-requests must be between 1 and 100, got {}",
            config.concurrent_requests
        )));
    }

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be greater than 0".to_string(),
        ));
    }

    if !(config.retry_delay >= 0.0 && config.retry_delay.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "retry-delay must be >= 0, got {}",
            config.retry_delay
        )));
    }

    if !(config.delay_between_requests >= 0.0 && config.delay_between_requests.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "delay-between-requests must be >= 0, got {}",
            config.delay_between_requests
        )));
    }

    Ok(())
}

/// Validates domain patterns and path patterns
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if let Some(domains) = &config.allowed_domains {
        for pattern in domains {
            if !is_valid_domain_pattern(&pattern.to_lowercase()) {
                return Err(ConfigError::InvalidPattern(format!(
                    "Invalid domain pattern '{}'",
                    pattern
                )));
            }
        }
    }

    for pattern in &config.allowed_path {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid allowed-path '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "data-batch-size must be >= 1, got {}",
            config.data_batch_size
        )));
    }

    if config.sqlite_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "sqlite-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every extraction selector parses as CSS
fn validate_extract_selectors(fields: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (field, selector) in fields {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!(
                "Invalid selector for extract field '{}': {:?}",
                field, e
            ))
        })?;
    }
    Ok(())
}
