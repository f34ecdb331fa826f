//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling with {} lanes", config.client.concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Backend, ClientConfig, Config, CrawlMode, DiscoveryConfig, OutputConfig, DEFAULT_NAME,
    DEFAULT_USER_AGENT,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
