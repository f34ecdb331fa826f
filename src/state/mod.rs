//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `LinkStatus`: lifecycle of a single frontier link (unprocessed, processed, failed)
//! - `CrawlPhase`: the coordinator's phase within one run

mod crawl_phase;
mod link_status;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use link_status::LinkStatus;
