//! Ticker service
//!
//! Wires the watchlist, the refresh engine, the animator and the catalog
//! together and owns their background tasks until `shutdown`.

use crate::{
    animator::{start_animator, TickerSink},
    catalog::{self, Catalog},
    config::TickerConfig,
    display::snapshot_channel,
    engine::{EngineHandle, PriceRefreshEngine},
    error::WatchlistError,
    lifecycle::TaskHandle,
    metrics::PollMetrics,
    provider::MarketDataClient,
    types::AssetId,
    watchlist::Watchlist,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Running price ticker
///
/// Must be started from within a tokio runtime.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use price_ticker::{
///     animator::LogSink, providers::CoinGeckoClient, watchlist::{Watchlist, WatchlistFile},
///     PriceTicker, TickerConfig,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TickerConfig::from_env();
/// let client = Arc::new(CoinGeckoClient::with_config(&config.api_url, config.request_timeout)?);
/// let watchlist = Watchlist::open(WatchlistFile::new(&config.watchlist_path));
///
/// let ticker = PriceTicker::start(&config, client, watchlist, Arc::new(LogSink));
/// ticker.request_pin("bitcoin")?;
/// tokio::signal::ctrl_c().await?;
/// ticker.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct PriceTicker {
    watchlist: Watchlist,
    engine: EngineHandle,
    animator: TaskHandle,
    catalog: watch::Receiver<Arc<Catalog>>,
    catalog_task: JoinHandle<()>,
}

impl PriceTicker {
    /// Starts polling, animating into `sink`, and loading the catalog
    pub fn start(
        config: &TickerConfig,
        client: Arc<dyn MarketDataClient>,
        watchlist: Watchlist,
        sink: Arc<dyn TickerSink>,
    ) -> Self {
        let (publisher, subscriber) = snapshot_channel();

        let animator = start_animator(subscriber, sink, config.tick_interval);
        let engine = PriceRefreshEngine::new(client.clone(), publisher, config.request_timeout)
            .start(watchlist.reader(), config.refresh_interval);
        let (catalog, catalog_task) = catalog::load_in_background(client);

        tracing::info!(
            assets = watchlist.len(),
            refresh_interval_secs = config.refresh_interval.as_secs(),
            "Price ticker started"
        );

        Self {
            watchlist,
            engine,
            animator,
            catalog,
            catalog_task,
        }
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Current watchlist ids in order
    pub fn current_watchlist(&self) -> Vec<AssetId> {
        self.watchlist.ids()
    }

    /// Pins an asset; it is included from the next poll on
    pub fn request_pin(&self, raw: &str) -> Result<bool, WatchlistError> {
        self.watchlist.pin(raw)
    }

    pub fn catalog(&self) -> watch::Receiver<Arc<Catalog>> {
        self.catalog.clone()
    }

    pub fn metrics(&self) -> PollMetrics {
        self.engine.metrics()
    }

    /// Stops every background task and waits for them to exit
    pub async fn shutdown(self) {
        tracing::info!("Shutting down price ticker");
        self.catalog_task.abort();
        futures::future::join(self.engine.stop(), self.animator.stop()).await;
        tracing::info!("Price ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::FrameChannel;
    use crate::provider::mock::MockClient;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_pin_reaches_ticker_and_shutdown_stops_updates() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(1234.5), Some(3.2));
        client.set_quote("solana", Some(0.00452), Some(-1.0));
        client.set_catalog(&["bitcoin", "solana"]);

        let config = TickerConfig::default().with_refresh_secs(30);
        let (frames, rx) = FrameChannel::new();
        let watchlist = Watchlist::new(vec![AssetId::new("bitcoin").unwrap()]);
        let ticker = PriceTicker::start(&config, client.clone(), watchlist, Arc::new(frames));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.borrow().sequence, 1);
        assert_eq!(ticker.catalog().borrow().len(), 2);

        assert!(ticker.request_pin("solana").unwrap());
        assert!(!ticker.request_pin("solana").unwrap());
        assert_eq!(ticker.current_watchlist().len(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let frame = rx.borrow().clone();
        assert_eq!(frame.sequence, 2);
        assert_eq!(frame.spans.len(), 2);
        assert_eq!(ticker.metrics().total_cycles, 2);

        ticker.shutdown().await;
        let calls = client.call_count();
        let visible = rx.borrow().visible.clone();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(client.call_count(), calls);
        assert_eq!(rx.borrow().visible, visible);
    }
}
