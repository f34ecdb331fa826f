use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Provider: {}", config.name);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at start-up so runs over the same frontier can be told apart when
/// the configuration changed in between.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, CrawlMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
name = "shoes"
mode = "continue"
entry-urls = ["https://www.shop.com/shoes"]

[client]
concurrent-requests = 4
retries = 3
retry-delay = 1.5
delay-between-requests = 0.5
timeout-seconds = 20
user-agent = "TestAgent/1.0"
backend = "rendered"
auto-scroll-to-bottom = false

[discovery]
allowed-domains = ["*.shop.com"]
allowed-path = ["shop.com/shoes/.*"]
remove-query-params = false

[output]
data-path = "./data"
data-batch-size = 10
sqlite-path = "./shoes.sqlite"

[extract]
title = "h1"
price = ".price"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.name, "shoes");
        assert_eq!(config.mode, CrawlMode::Continue);
        assert_eq!(config.client.concurrent_requests, 4);
        assert_eq!(config.client.retries, 3);
        assert_eq!(config.client.user_agent, "TestAgent/1.0");
        assert_eq!(config.client.backend, Backend::Rendered);
        assert!(!config.client.auto_scroll_to_bottom);
        assert_eq!(
            config.discovery.allowed_domains,
            Some(vec!["*.shop.com".to_string()])
        );
        assert!(!config.discovery.remove_query_params);
        assert_eq!(config.output.data_batch_size, 10);
        assert_eq!(config.extract.len(), 2);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_entry_urls_is_parse_error() {
        let file = create_temp_config(r#"name = "x""#);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
entry-urls = ["https://www.shop.com"]

[client]
concurrent-requests = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(r#"entry-urls = ["https://www.shop.com"]"#);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.entry_urls.len(), 1);
        assert_eq!(hash.len(), 64);
    }
}
