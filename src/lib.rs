//! Sumi-Harvest: a resumable, configurable crawl engine
//!
//! This crate fetches pages from a persistent frontier of URLs, discovers
//! outbound links under domain/path rules, hands each page to a caller-supplied
//! extraction function and records per-URL visit state so a crawl can be
//! resumed or restarted.

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Fetch client error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Missing required hook: {0}")]
    MissingHook(&'static str),
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlMode};
pub use crawler::{CrawlReport, Crawler, CrawlerBuilder, Hooks};
pub use fetch::{FetchClient, FetchRequest, FetchResult, Page};
pub use state::{CrawlPhase, LinkStatus};
pub use storage::{Link, LinkStore, MemoryLinkStore, NewLink, SqliteLinkStore};
