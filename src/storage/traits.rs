//! Storage traits and error types
//!
//! This module defines the trait interface for link frontier backends and
//! associated error types.

use crate::state::LinkStatus;
use crate::storage::{Link, NewLink};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Link not found: {0}")]
    LinkNotFound(i64),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: LinkStatus, to: LinkStatus },

    #[error("Unknown link status in database: {0}")]
    UnknownStatus(String),

    #[error("Link store lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for link frontier implementations
///
/// The coordinator is the single writer; implementations do not need to
/// handle concurrent writers, but must be `Send` so the store can be shared
/// with the progress logger.
pub trait LinkStore: Send {
    /// Inserts a link unless `(provider, url)` already exists
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Link))` - The newly stored link
    /// * `Ok(None)` - The link was already present; nothing changed
    fn add_if_new(&mut self, link: NewLink) -> StorageResult<Option<Link>>;

    /// Moves a link to a new status
    ///
    /// Only `Unprocessed -> Processed` and `Unprocessed -> Failed` are accepted.
    fn change_status(&mut self, id: i64, status: LinkStatus) -> StorageResult<()>;

    /// Returns at most `limit` links of a provider in the given status
    fn find_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
        limit: usize,
    ) -> StorageResult<Vec<Link>>;

    /// Counts links of a provider in the given status
    fn count_by_provider_and_status(&self, provider: &str, status: LinkStatus)
        -> StorageResult<u64>;

    /// Counts all links of a provider
    fn count_by_provider(&self, provider: &str) -> StorageResult<u64>;

    /// Deletes every link of a provider, returning how many were removed
    fn delete_all(&mut self, provider: &str) -> StorageResult<u64>;
}

impl<T: LinkStore + ?Sized> LinkStore for Box<T> {
    fn add_if_new(&mut self, link: NewLink) -> StorageResult<Option<Link>> {
        (**self).add_if_new(link)
    }

    fn change_status(&mut self, id: i64, status: LinkStatus) -> StorageResult<()> {
        (**self).change_status(id, status)
    }

    fn find_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
        limit: usize,
    ) -> StorageResult<Vec<Link>> {
        (**self).find_by_provider_and_status(provider, status, limit)
    }

    fn count_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
    ) -> StorageResult<u64> {
        (**self).count_by_provider_and_status(provider, status)
    }

    fn count_by_provider(&self, provider: &str) -> StorageResult<u64> {
        (**self).count_by_provider(provider)
    }

    fn delete_all(&mut self, provider: &str) -> StorageResult<u64> {
        (**self).delete_all(provider)
    }
}
