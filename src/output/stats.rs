//! Frontier statistics
//!
//! This module extracts and displays per-provider link counts from the
//! link store.

use crate::state::LinkStatus;
use crate::storage::{LinkStore, StorageResult};

/// Link counts for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierStatistics {
    pub provider: String,

    /// Total number of links stored
    pub total_links: u64,

    /// Count of links by status, in lifecycle order
    pub links_by_status: Vec<(LinkStatus, u64)>,
}

impl FrontierStatistics {
    /// Returns the count for one status
    pub fn count(&self, status: LinkStatus) -> u64 {
        self.links_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Percentage of finished links that were processed successfully
    pub fn success_rate(&self) -> f64 {
        let processed = self.count(LinkStatus::Processed);
        let finished = processed + self.count(LinkStatus::Failed);
        if finished == 0 {
            return 0.0;
        }
        (processed as f64 / finished as f64) * 100.0
    }
}

/// Loads statistics for a provider
pub fn load_statistics(store: &dyn LinkStore, provider: &str) -> StorageResult<FrontierStatistics> {
    let total_links = store.count_by_provider(provider)?;

    let links_by_status = LinkStatus::all()
        .into_iter()
        .map(|status| {
            store
                .count_by_provider_and_status(provider, status)
                .map(|count| (status, count))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    Ok(FrontierStatistics {
        provider: provider.to_string(),
        total_links,
        links_by_status,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &FrontierStatistics) {
    println!("=== Frontier Statistics: {} ===\n", stats.provider);

    println!("Total links: {}", stats.total_links);
    println!();

    println!("Links by Status:");
    for (status, count) in &stats.links_by_status {
        let percentage = if stats.total_links > 0 {
            (*count as f64 / stats.total_links as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} processed, {} failed)",
        stats.success_rate(),
        stats.count(LinkStatus::Processed),
        stats.count(LinkStatus::Failed)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryLinkStore, NewLink};

    #[test]
    fn test_load_statistics() {
        let mut store = MemoryLinkStore::new();
        let ids: Vec<i64> = (0..4)
            .map(|i| {
                store
                    .add_if_new(NewLink::unprocessed("shop", format!("https://shop.com/{}", i)))
                    .unwrap()
                    .unwrap()
                    .id
            })
            .collect();
        store
            .add_if_new(NewLink::unprocessed("other", "https://other.com"))
            .unwrap();
        store.change_status(ids[0], LinkStatus::Processed).unwrap();
        store.change_status(ids[1], LinkStatus::Processed).unwrap();
        store.change_status(ids[2], LinkStatus::Failed).unwrap();

        let stats = load_statistics(&store, "shop").unwrap();

        assert_eq!(stats.total_links, 4);
        assert_eq!(stats.count(LinkStatus::Unprocessed), 1);
        assert_eq!(stats.count(LinkStatus::Processed), 2);
        assert_eq!(stats.count(LinkStatus::Failed), 1);
        assert!((stats.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_with_nothing_finished() {
        let stats = FrontierStatistics {
            provider: "shop".to_string(),
            total_links: 3,
            links_by_status: vec![(LinkStatus::Unprocessed, 3)],
        };
        assert_eq!(stats.success_rate(), 0.0);
    }
}
