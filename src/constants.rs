//! Constants for the price ticker
//!
//! Compile-time defaults. `TickerConfig` starts from these and lets the
//! environment or the command line override the ones that make sense to tune.

use std::time::Duration;

/// How often to poll the price API (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Lower bound accepted for a configured refresh interval (in seconds)
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 30;

/// Upper bound accepted for a configured refresh interval (in seconds)
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 60;

/// HTTP request timeout when fetching prices (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Animator tick interval in reveal mode
pub const TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Shortest period accepted by the engine and animator timers
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko API endpoint listing every known coin
pub const COINGECKO_COINS_LIST_ENDPOINT: &str = "/coins/list";

/// Default location of the persisted watchlist
pub const WATCHLIST_FILE: &str = "pinned_tokens.json";

/// Log file used while the terminal UI owns the screen
pub const LOG_FILE: &str = "price-ticker.log";

/// Placeholder shown for an asset without a price
pub const NO_DATA: &str = "no data";

/// Maximum number of catalog suggestions returned by a search
pub const MAX_SUGGESTIONS: usize = 50;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "price-ticker/0.1.0";
