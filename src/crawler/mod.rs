//! Crawler module for frontier-driven crawling
//!
//! This module contains the core crawling logic, including:
//! - Assembling a crawler from configuration and hooks
//! - The batch loop over unprocessed links
//! - Link discovery and filtering
//! - Selector-based record extraction for the CLI
//! - Periodic progress logging

mod builder;
mod coordinator;
mod discovery;
mod extract;
mod progress;

pub use builder::{CrawlerBuilder, Hooks};
pub use coordinator::{CrawlReport, Crawler, BATCH_FLOOR, DEFAULT_PROGRESS_INTERVAL};
pub use discovery::{LinkDiscovery, LinksHook};
pub use extract::selector_extractor;

use crate::fetch::Page;
use crate::output::Record;
use crate::storage::LinkStore;
use std::sync::{Arc, Mutex};

/// Turns a fetched page into a record; `None` means nothing to emit
pub type ItemHook = Arc<dyn Fn(&Page) -> Option<Record> + Send + Sync>;

/// Link store shared between the crawl loop and the progress logger
pub type SharedLinkStore = Arc<Mutex<Box<dyn LinkStore>>>;
