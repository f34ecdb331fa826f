//! Output module for extracted records and crawl statistics
//!
//! This module handles:
//! - The `DataStore` interface the crawler forwards records to
//! - The default batched JSON file store
//! - Per-provider frontier statistics for the CLI

mod file_store;
pub mod stats;
mod traits;

pub use file_store::FileDataStore;
pub use stats::{load_statistics, print_statistics, FrontierStatistics};
pub use traits::{DataEntry, DataStore, OutputError, OutputResult, Record};
