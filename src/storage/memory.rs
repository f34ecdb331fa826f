//! In-memory storage implementation
//!
//! Nothing is persisted; useful for tests and for embedding a one-shot crawl.

use crate::state::LinkStatus;
use crate::storage::traits::{LinkStore, StorageError, StorageResult};
use crate::storage::{Link, NewLink};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

/// In-memory link frontier backend
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    links: BTreeMap<i64, Link>,
    index: HashMap<(String, String), i64>,
    next_id: i64,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored link of a provider, ordered by id
    pub fn links(&self, provider: &str) -> Vec<Link> {
        self.links
            .values()
            .filter(|link| link.provider == provider)
            .cloned()
            .collect()
    }
}

impl LinkStore for MemoryLinkStore {
    fn add_if_new(&mut self, link: NewLink) -> StorageResult<Option<Link>> {
        let key = (link.provider.clone(), link.url.clone());
        if self.index.contains_key(&key) {
            return Ok(None);
        }

        self.next_id += 1;
        let now = Utc::now();
        let stored = Link {
            id: self.next_id,
            provider: link.provider,
            url: link.url,
            status: link.status,
            added_at: now,
            updated_at: now,
        };

        self.index.insert(key, stored.id);
        self.links.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    fn change_status(&mut self, id: i64, status: LinkStatus) -> StorageResult<()> {
        let link = self
            .links
            .get_mut(&id)
            .ok_or(StorageError::LinkNotFound(id))?;

        if !link.status.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                from: link.status,
                to: status,
            });
        }

        link.status = status;
        link.updated_at = Utc::now();
        Ok(())
    }

    fn find_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
        limit: usize,
    ) -> StorageResult<Vec<Link>> {
        Ok(self
            .links
            .values()
            .filter(|link| link.provider == provider && link.status == status)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
    ) -> StorageResult<u64> {
        Ok(self
            .links
            .values()
            .filter(|link| link.provider == provider && link.status == status)
            .count() as u64)
    }

    fn count_by_provider(&self, provider: &str) -> StorageResult<u64> {
        Ok(self
            .links
            .values()
            .filter(|link| link.provider == provider)
            .count() as u64)
    }

    fn delete_all(&mut self, provider: &str) -> StorageResult<u64> {
        let before = self.links.len();
        self.links.retain(|_, link| link.provider != provider);
        self.index.retain(|(p, _), _| p != provider);
        Ok((before - self.links.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_if_new_is_idempotent() {
        let mut store = MemoryLinkStore::new();
        assert!(store
            .add_if_new(NewLink::unprocessed("p", "https://a.com"))
            .unwrap()
            .is_some());
        assert!(store
            .add_if_new(NewLink::unprocessed("p", "https://a.com"))
            .unwrap()
            .is_none());
        assert_eq!(store.links("p").len(), 1);
    }

    #[test]
    fn test_transitions_enforced() {
        let mut store = MemoryLinkStore::new();
        let link = store
            .add_if_new(NewLink::unprocessed("p", "https://a.com"))
            .unwrap()
            .unwrap();

        store.change_status(link.id, LinkStatus::Processed).unwrap();
        assert!(store.change_status(link.id, LinkStatus::Failed).is_err());
        assert!(matches!(
            store.change_status(99, LinkStatus::Failed),
            Err(StorageError::LinkNotFound(99))
        ));
    }

    #[test]
    fn test_find_and_delete() {
        let mut store = MemoryLinkStore::new();
        for i in 0..4 {
            store
                .add_if_new(NewLink::unprocessed("p", format!("https://a.com/{}", i)))
                .unwrap();
        }
        store
            .add_if_new(NewLink::unprocessed("q", "https://a.com/0"))
            .unwrap();

        let found = store
            .find_by_provider_and_status("p", LinkStatus::Unprocessed, 2)
            .unwrap();
        assert_eq!(found.len(), 2);

        assert_eq!(store.delete_all("p").unwrap(), 4);
        assert_eq!(store.count_by_provider("q").unwrap(), 1);

        // Deleted URLs can be re-added
        assert!(store
            .add_if_new(NewLink::unprocessed("p", "https://a.com/0"))
            .unwrap()
            .is_some());
    }
}
