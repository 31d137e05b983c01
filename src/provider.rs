//! Provider abstraction for querying the market data API

use crate::{
    error::ProviderError,
    types::{AssetId, CatalogEntry, Quote},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for market data clients
///
/// Only one price query shape is needed: quotes for an ordered set of ids.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches USD price and 24h change for every id in a single request
    ///
    /// Ids the provider does not know are simply absent from the result.
    async fn fetch_quotes(
        &self,
        ids: &[AssetId],
    ) -> Result<HashMap<AssetId, Quote>, ProviderError>;

    /// Fetches the list of every asset the provider knows about
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock client for testing
    #[derive(Default)]
    pub struct MockClient {
        quotes: Mutex<HashMap<AssetId, (Option<f64>, Option<f64>)>>,
        catalog: Mutex<Vec<CatalogEntry>>,
        failing: AtomicBool,
        delay: Mutex<Option<Duration>>,
        call_count: AtomicUsize,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_quote(&self, id: &str, price: Option<f64>, change_24h: Option<f64>) {
            let id = AssetId::new(id).unwrap();
            self.quotes.lock().unwrap().insert(id, (price, change_24h));
        }

        pub fn set_catalog(&self, ids: &[&str]) {
            *self.catalog.lock().unwrap() = ids
                .iter()
                .map(|id| CatalogEntry {
                    id: id.to_string(),
                    symbol: String::new(),
                    name: String::new(),
                })
                .collect();
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Makes every fetch take `delay` before answering
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataClient for MockClient {
        async fn fetch_quotes(
            &self,
            ids: &[AssetId],
        ) -> Result<HashMap<AssetId, Quote>, ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(ProviderError::ApiError("HTTP 500: mock".to_string()));
            }

            let quotes = self.quotes.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| {
                    quotes
                        .get(id)
                        .map(|(price, change)| (id.clone(), Quote::new(id.clone(), *price, *change)))
                })
                .collect())
        }

        async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ProviderError::RateLimitExceeded);
            }
            Ok(self.catalog.lock().unwrap().clone())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
