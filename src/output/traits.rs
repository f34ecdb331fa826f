//! Output collaborator traits and types
//!
//! This module defines the interface the crawler hands extracted records to,
//! and the record envelope it sends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A JSON object produced by the item-crawled hook
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One extracted record together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub provider: String,
    pub url: String,
    pub data: Record,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataEntry {
    /// Wraps a record, stamping both timestamps with the current time
    pub fn new(provider: impl Into<String>, url: impl Into<String>, data: Record) -> Self {
        let now = Utc::now();
        Self {
            provider: provider.into(),
            url: url.into(),
            data,
            added_at: now,
            updated_at: now,
        }
    }
}

/// Trait for output stores
///
/// The crawler calls `before_crawl` once, `add_data` for every record, and
/// `after_crawl` once when the frontier is exhausted.
pub trait DataStore: Send {
    /// Prepares the store for a new crawl
    fn before_crawl(&mut self) -> OutputResult<()>;

    /// Accepts one record
    fn add_data(&mut self, entry: DataEntry) -> OutputResult<()>;

    /// Flushes anything still buffered
    fn after_crawl(&mut self) -> OutputResult<()>;
}

impl<T: DataStore + ?Sized> DataStore for Box<T> {
    fn before_crawl(&mut self) -> OutputResult<()> {
        (**self).before_crawl()
    }

    fn add_data(&mut self, entry: DataEntry) -> OutputResult<()> {
        (**self).add_data(entry)
    }

    fn after_crawl(&mut self) -> OutputResult<()> {
        (**self).after_crawl()
    }
}
