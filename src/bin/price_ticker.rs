//! Price Ticker - animated terminal watchlist of cryptocurrency prices
//!
//! Runs the terminal UI by default. With `--headless` the ticker logs each
//! new snapshot instead and runs until Ctrl-C.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use price_ticker::{
    animator::{FrameChannel, LogSink, TickerSink},
    constants::LOG_FILE,
    providers::CoinGeckoClient,
    telemetry,
    ui::{self, App},
    PriceTicker, TickerConfig, Watchlist, WatchlistFile,
};

/// How long the UI waits for input before redrawing
const INPUT_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(name = "price-ticker", version, about = "Animated cryptocurrency price ticker")]
struct Args {
    /// Seconds between price polls (30-60)
    #[arg(long)]
    interval: Option<u64>,

    /// Watchlist file
    #[arg(long)]
    watchlist: Option<PathBuf>,

    /// Price API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Asset id to pin before starting (repeatable)
    #[arg(long = "pin", value_name = "ID")]
    pins: Vec<String>,

    /// Log snapshots instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,
}

impl Args {
    fn into_config(self) -> (TickerConfig, Vec<String>) {
        let mut config = TickerConfig::from_env();
        if let Some(secs) = self.interval {
            config = config.with_refresh_secs(secs);
        }
        if let Some(path) = self.watchlist {
            config.watchlist_path = path;
        }
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        (config, self.pins)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let headless = args.headless;

    // Logging to the terminal would corrupt the alternate screen
    if headless {
        telemetry::init_tracing(telemetry::DEFAULT_FILTER);
    } else {
        telemetry::init_file_tracing(telemetry::DEFAULT_FILTER, Path::new(LOG_FILE))
            .with_context(|| format!("creating log file {LOG_FILE}"))?;
    }

    let (config, pins) = args.into_config();
    tracing::debug!(?config, "Loaded configuration");

    let runtime = tokio::runtime::Runtime::new().context("creating tokio runtime")?;

    let client = Arc::new(
        CoinGeckoClient::with_config(&config.api_url, config.request_timeout)
            .context("building HTTP client")?,
    );
    let watchlist = Watchlist::open(WatchlistFile::new(&config.watchlist_path));
    for pin in &pins {
        if let Err(e) = watchlist.pin(pin) {
            tracing::warn!(error = %e, "Ignoring --pin");
        }
    }

    if headless {
        return runtime.block_on(run_headless(&config, client, watchlist));
    }

    let (frames, frame_rx) = FrameChannel::new();
    let sink: Arc<dyn TickerSink> = Arc::new(frames);
    let ticker = {
        let _guard = runtime.enter();
        PriceTicker::start(&config, client, watchlist, sink)
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = {
        let mut app = App::new(&ticker, frame_rx);
        run_app(&mut terminal, &mut app)
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Background tasks must be gone before the process exits
    runtime.block_on(ticker.shutdown());

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn run_headless(
    config: &TickerConfig,
    client: Arc<CoinGeckoClient>,
    watchlist: Watchlist,
) -> Result<()> {
    if watchlist.is_empty() {
        tracing::warn!("Watchlist is empty, pin assets with --pin <id>");
    }

    let ticker = PriceTicker::start(config, client, watchlist, Arc::new(LogSink));
    let signal = tokio::signal::ctrl_c().await;
    ticker.shutdown().await;
    signal.context("waiting for Ctrl-C")
}
