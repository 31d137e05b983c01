//! # Price Ticker
//!
//! Tracks a small, user-curated watchlist of cryptocurrency assets and keeps
//! an animated display of their latest USD price and 24h change, polled from
//! CoinGecko.
//!
//! ## Architecture
//!
//! ```text
//! Watchlist ──▶ PriceRefreshEngine (polls every 60s)
//!                     │ publishes only on change (latest wins)
//!                     ▼
//!               TickerAnimator (ticks every 20ms, reveal effect)
//!                     │
//!                     ▼
//!               TickerSink (terminal UI / log)
//! ```
//!
//! The engine and the animator are independent tasks: a slow or failing
//! price query never delays an animation tick. A failed query renders every
//! tracked asset as "no data" until the next poll.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use price_ticker::{animator::LogSink, providers::CoinGeckoClient, PriceTicker, TickerConfig, Watchlist};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TickerConfig::default();
//! let client = Arc::new(CoinGeckoClient::new()?);
//! let watchlist = Watchlist::new(Vec::new());
//! watchlist.pin("bitcoin")?;
//!
//! let ticker = PriceTicker::start(&config, client, watchlist, Arc::new(LogSink));
//! // ...
//! ticker.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod animator;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod display;
pub mod engine;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod telemetry;
pub mod ticker;
pub mod types;
pub mod ui;
pub mod watchlist;

// Re-export commonly used types
pub use config::TickerConfig;
pub use engine::PriceRefreshEngine;
pub use error::{ProviderError, WatchlistError};
pub use metrics::PollMetrics;
pub use provider::MarketDataClient;
pub use ticker::PriceTicker;
pub use types::{AssetId, ColorMarker, Quote, RenderedLine, Snapshot};
pub use watchlist::{Watchlist, WatchlistFile};
