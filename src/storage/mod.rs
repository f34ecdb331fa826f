//! Storage module for the link frontier
//!
//! This module handles persistence of discovered links, including:
//! - SQLite database initialization and schema management
//! - Deduplicated insertion per provider
//! - Status transitions from unprocessed to a terminal state
//! - Batch lookup and counting by provider and status

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryLinkStore;
pub use sqlite::SqliteLinkStore;
pub use traits::{LinkStore, StorageError, StorageResult};

use crate::state::LinkStatus;
use chrono::{DateTime, Utc};

/// A link row owned by the frontier store
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub provider: String,
    pub url: String,
    pub status: LinkStatus,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A link to be inserted into the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub provider: String,
    pub url: String,
    pub status: LinkStatus,
}

impl NewLink {
    /// Creates an unprocessed link for the given provider
    pub fn unprocessed(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            url: url.into(),
            status: LinkStatus::Unprocessed,
        }
    }
}
