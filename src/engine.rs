//! Price refresh engine
//!
//! Polls the market data client on a fixed cadence, turns the result into a
//! `Snapshot` and publishes it only when it differs from the last published
//! one.
//!
//! ```text
//! WatchlistReader ──ids──▶ PriceRefreshEngine ──fetch_quotes──▶ MarketDataClient
//!                                 │
//!                                 ▼ (only on change)
//!                          SnapshotPublisher ──▶ animator
//! ```

use crate::{
    constants::MIN_TIMER_PERIOD,
    display::{Publication, SnapshotPublisher},
    error::ProviderError,
    lifecycle::{StopSignal, TaskHandle},
    metrics::{MetricsCollector, PollMetrics},
    provider::MarketDataClient,
    types::{AssetId, Quote, Snapshot},
    watchlist::WatchlistReader,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Polls prices and publishes changed snapshots
pub struct PriceRefreshEngine {
    client: Arc<dyn MarketDataClient>,
    publisher: SnapshotPublisher,
    metrics: Arc<MetricsCollector>,
    request_timeout: Duration,
    last_published: Option<Arc<Snapshot>>,
}

impl PriceRefreshEngine {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        publisher: SnapshotPublisher,
        request_timeout: Duration,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new(client.provider_name()));
        Self {
            client,
            publisher,
            metrics,
            request_timeout,
            last_published: None,
        }
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Spawns the polling loop
    ///
    /// The first cycle runs immediately, then one every `interval` (at least
    /// `MIN_TIMER_PERIOD`). The loop only ends when the returned handle is
    /// stopped or dropped.
    pub fn start(self, watchlist: WatchlistReader, interval: Duration) -> EngineHandle {
        let metrics = self.metrics.clone();
        let task = TaskHandle::spawn("price-refresh", move |stop| {
            self.run(watchlist, interval, stop)
        });
        EngineHandle { task, metrics }
    }

    async fn run(mut self, watchlist: WatchlistReader, interval: Duration, mut stop: StopSignal) {
        let interval = interval.max(MIN_TIMER_PERIOD);
        tracing::info!(
            refresh_interval_ms = interval.as_millis() as u64,
            provider = self.client.provider_name(),
            "Starting price refresh engine"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {}
            }

            let ids = watchlist.current();
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = self.run_cycle(&ids) => {}
            }
        }

        tracing::info!(
            published = self.publisher.published_count(),
            "Price refresh engine stopped"
        );
    }

    /// Runs one poll cycle for `ids`
    ///
    /// Returns the publication if the snapshot changed, `None` otherwise.
    pub async fn run_cycle(&mut self, ids: &[AssetId]) -> Option<Publication> {
        let quotes = self.fetch_or_empty(ids).await;
        let snapshot = Snapshot::build(ids, &quotes);

        if self.last_published.as_deref() == Some(&snapshot) {
            tracing::debug!(assets = ids.len(), "Snapshot unchanged, not publishing");
            return None;
        }

        let snapshot = Arc::new(snapshot);
        self.last_published = Some(snapshot.clone());
        let publication = self.publisher.publish(snapshot);

        tracing::info!(
            sequence = publication.sequence,
            assets = ids.len(),
            "Published new snapshot"
        );
        Some(publication)
    }

    /// Queries the client; any failure degrades to an empty result
    async fn fetch_or_empty(&self, ids: &[AssetId]) -> HashMap<AssetId, Quote> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let start = Instant::now();
        let result = match tokio::time::timeout(self.request_timeout, self.client.fetch_quotes(ids))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(quotes) => {
                tracing::debug!(
                    count = quotes.len(),
                    provider = self.client.provider_name(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Fetched quotes"
                );
                self.metrics.record_cycle(start.elapsed(), true);
                quotes
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = self.client.provider_name(),
                    "Failed to fetch quotes, showing no data until next poll"
                );
                self.metrics.record_cycle(start.elapsed(), false);
                HashMap::new()
            }
        }
    }
}

/// Handle to a running engine
#[derive(Debug)]
pub struct EngineHandle {
    task: TaskHandle,
    metrics: Arc<MetricsCollector>,
}

impl EngineHandle {
    pub fn metrics(&self) -> PollMetrics {
        self.metrics.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops polling; no publication happens once this returns
    pub async fn stop(self) {
        self.task.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::snapshot_channel;
    use crate::provider::mock::MockClient;
    use crate::types::ColorMarker;

    fn ids(raw: &[&str]) -> Vec<AssetId> {
        raw.iter().map(|s| AssetId::new(s).unwrap()).collect()
    }

    fn engine(client: Arc<MockClient>) -> (PriceRefreshEngine, crate::display::SnapshotSubscriber) {
        let (publisher, subscriber) = snapshot_channel();
        (
            PriceRefreshEngine::new(client, publisher, Duration::from_secs(10)),
            subscriber,
        )
    }

    #[tokio::test]
    async fn test_identical_cycles_publish_once() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(1234.5), Some(3.2));
        let (mut engine, subscriber) = engine(client.clone());
        let watchlist = ids(&["bitcoin"]);

        assert!(engine.run_cycle(&watchlist).await.is_some());
        assert!(engine.run_cycle(&watchlist).await.is_none());
        assert_eq!(client.call_count(), 2);
        assert_eq!(subscriber.latest().unwrap().sequence, 1);

        client.set_quote("bitcoin", Some(1240.0), Some(3.5));
        let publication = engine.run_cycle(&watchlist).await.unwrap();
        assert_eq!(publication.sequence, 2);
        assert_eq!(publication.snapshot.lines[0].formatted_price, "$1240.00");
    }

    #[tokio::test]
    async fn test_failure_degrades_to_no_data() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(1234.5), Some(-1.0));
        let (mut engine, _subscriber) = engine(client.clone());
        let watchlist = ids(&["bitcoin", "solana"]);

        let first = engine.run_cycle(&watchlist).await.unwrap();
        assert_eq!(first.snapshot.lines[0].color, ColorMarker::Down);

        client.set_failing(true);
        let degraded = engine.run_cycle(&watchlist).await.unwrap();
        assert!(degraded
            .snapshot
            .lines
            .iter()
            .all(|l| l.text().ends_with("no data") && l.color == ColorMarker::Neutral));
        assert_eq!(degraded.snapshot.lines.len(), 2);

        let metrics = engine.metrics().snapshot();
        assert_eq!(metrics.total_cycles, 2);
        assert_eq!(metrics.failed_cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(1.0), None);
        client.set_delay(Duration::from_secs(30));
        let (mut engine, _subscriber) = engine(client);

        let publication = engine.run_cycle(&ids(&["bitcoin"])).await.unwrap();
        assert_eq!(publication.snapshot.lines[0].formatted_price, "no data");
        assert_eq!(engine.metrics().snapshot().failed_cycles, 1);
    }

    #[tokio::test]
    async fn test_empty_watchlist_skips_request() {
        let client = Arc::new(MockClient::new());
        let (mut engine, _subscriber) = engine(client.clone());

        let publication = engine.run_cycle(&[]).await.unwrap();
        assert!(publication.snapshot.is_empty());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_polling_and_stop() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(100.0), Some(1.0));
        let (engine, mut subscriber) = engine(client.clone());
        let watchlist = crate::watchlist::Watchlist::new(ids(&["bitcoin"]));

        let handle = engine.start(watchlist.reader(), Duration::from_secs(30));

        let first = subscriber.next().await.unwrap();
        assert_eq!(first.sequence, 1);

        // t=0, 30, 60 with identical prices: one publication only
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(client.call_count(), 3);
        assert_eq!(subscriber.latest().unwrap().sequence, 1);

        // A pin shows up at the next poll
        watchlist.pin("solana").unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let latest = subscriber.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.snapshot.lines[1].text(), "solana: no data");

        handle.stop().await;
        let calls = client.call_count();
        client.set_quote("bitcoin", Some(200.0), Some(1.0));
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(client.call_count(), calls);
        assert_eq!(subscriber.latest().unwrap().sequence, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let client = Arc::new(MockClient::new());
        client.set_quote("bitcoin", Some(100.0), Some(1.0));
        let (engine, mut subscriber) = engine(client.clone());

        let handle = engine.start(ids(&["bitcoin"]).into(), Duration::ZERO);
        assert_eq!(subscriber.next().await.unwrap().sequence, 1);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(client.call_count() > 1);
        assert!(!handle.is_finished());

        handle.stop().await;
        let calls = client.call_count();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.call_count(), calls);
    }
}
