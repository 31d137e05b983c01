//! Coin catalog used for pin suggestions
//!
//! Loaded once in the background. A failed load only means there are no
//! suggestions; the user can still pin an id by typing it.

use crate::{constants::MAX_SUGGESTIONS, provider::MarketDataClient, types::CatalogEntry};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Searchable list of known assets
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose id contains `query`, ignoring case
    ///
    /// An empty query matches everything. At most `MAX_SUGGESTIONS` results.
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.id.to_lowercase().contains(&query))
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

/// Spawns the catalog download, publishing the result on a watch channel
///
/// The receiver starts with an empty catalog and is updated at most once.
pub fn load_in_background(
    client: Arc<dyn MarketDataClient>,
) -> (watch::Receiver<Arc<Catalog>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(Arc::new(Catalog::default()));

    let handle = tokio::spawn(async move {
        match client.fetch_catalog().await {
            Ok(entries) => {
                tracing::info!(count = entries.len(), "Loaded coin catalog");
                tx.send_replace(Arc::new(Catalog::new(entries)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load coin catalog, suggestions disabled");
            }
        }
    });

    (rx, handle)
}
