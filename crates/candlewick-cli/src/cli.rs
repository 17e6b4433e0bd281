//! CLI argument definitions for Candlewick.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `candles` | Retrieve OHLCV candles with provider fallback |
//! | `asset` | Latest known price for one instrument |
//! | `warmup` | Pre-load the cache and report per-target status |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Exit non-zero when data is degraded |
//!
//! # Examples
//!
//! ```bash
//! candlewick candles crypto BTCUSDT --timeframe 1h --limit 50
//! candlewick candles equity AAPL --timeframe 1d --pretty
//! candlewick asset cedears AAPL.BA
//! candlewick warmup --target crypto:ETHUSDT:4h
//! ```

use clap::{Args, Parser, Subcommand};

/// Candlewick - resilient multi-provider candle retrieval
#[derive(Debug, Parser)]
#[command(
    name = "candlewick",
    author,
    version,
    about = "Resilient multi-provider candle retrieval",
    long_about = "Candlewick retrieves OHLCV candles from CoinGecko, Binance and Yahoo Finance.\n\
\n\
Crypto requests fall through the providers in order. Equity requests are served \
from cache when fresh and fall back to the last cached series when Yahoo fails.\n\
\n\
Provider endpoints, timeouts and cache TTLs are read from CANDLEWICK_* variables."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 5 when the answer is degraded or unavailable.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retrieve candles for one instrument.
    ///
    /// # Examples
    ///
    ///   candlewick candles crypto BTCUSDT
    ///   candlewick candles equity AAPL --timeframe 1d --limit 30
    Candles(CandlesArgs),

    /// Latest known price for one instrument, from the daily series.
    Asset(AssetArgs),

    /// Pre-load the cache for a set of instruments.
    ///
    /// Without `--target`, warms the default equity and depositary
    /// receipt daily series.
    Warmup(WarmupArgs),
}

/// Arguments for the `candles` command.
#[derive(Debug, Args)]
pub struct CandlesArgs {
    /// Market class: crypto, equity or depositary-receipt.
    pub market: String,

    /// Instrument symbol (e.g., BTCUSDT, AAPL, AAPL.BA).
    pub symbol: String,

    /// Candle timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w, 1mo, ...).
    #[arg(long, default_value = "1h")]
    pub timeframe: String,

    /// Number of candles to return (1..=1000).
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

/// Arguments for the `asset` command.
#[derive(Debug, Args)]
pub struct AssetArgs {
    pub market: String,
    pub symbol: String,
}

/// Arguments for the `warmup` command.
#[derive(Debug, Args)]
pub struct WarmupArgs {
    /// Target as `market:symbol:timeframe`. May be repeated.
    #[arg(long = "target", value_parser = parse_target)]
    pub targets: Vec<(String, String, String)>,
}

fn parse_target(raw: &str) -> Result<(String, String, String), String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(market), Some(symbol), Some(timeframe))
            if !market.is_empty() && !symbol.is_empty() && !timeframe.is_empty() =>
        {
            Ok((market.to_owned(), symbol.to_owned(), timeframe.to_owned()))
        }
        _ => Err(format!("expected market:symbol:timeframe, got '{raw}'")),
    }
}
