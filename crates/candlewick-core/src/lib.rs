//! # Candlewick Core
//!
//! Resilient OHLCV candle retrieval across several upstream providers.
//!
//! ## Overview
//!
//! - **Canonical candle model** with normalization of provider rows
//! - **Provider adapters** for CoinGecko, Binance and Yahoo Finance
//! - **TTL cache** that keeps expired entries for stale reads
//! - **Fallback resolver** that always answers with an outcome
//! - **Retrieval facade** validating caller input
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (CoinGecko, Binance, Yahoo) |
//! | [`cache`] | Candle cache, TTL policy and key types |
//! | [`clock`] | Injectable time source for expiry |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Domain models (Candle, Symbol, Timeframe, MarketClass) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Provider trait and error taxonomy |
//! | [`resolver`] | Per-market fallback chains |
//! | [`response`] | Client-facing response shape |
//! | [`retriever`] | Retrieval facade and builder |
//! | [`warmup`] | Start-up cache warm-up |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use candlewick_core::{CandleRetriever, FallbackOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let retriever = CandleRetriever::from_env()?;
//!
//!     match retriever.retrieve("equity", "AAPL", "1d", 100).await? {
//!         FallbackOutcome::Fresh { candles } => println!("{} fresh candles", candles.len()),
//!         FallbackOutcome::Stale { reference_price, .. } => {
//!             println!("degraded, last known close {reference_price}")
//!         }
//!         FallbackOutcome::Unavailable { .. } => println!("data temporarily unavailable"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ CandleRetriever │  validates market / symbol / timeframe / limit
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ FallbackResolver │────▶│ CandleCache      │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ CandleSource    │────▶│ HttpClient       │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Only caller input can fail a retrieval. Provider failures are absorbed
//! into [`FallbackOutcome`]:
//!
//! ```rust
//! use candlewick_core::RetrievalError;
//!
//! fn describe(error: &RetrievalError) -> &'static str {
//!     match error {
//!         RetrievalError::Validation(_) => "bad market, symbol or timeframe",
//!         RetrievalError::LimitOutOfRange { .. } => "limit must be 1..=1000",
//!         RetrievalError::UnsupportedTimeframe { .. } => "timeframe not served for market",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod resolver;
pub mod response;
pub mod retriever;
pub mod warmup;

// Adapter implementations
pub use adapters::{BinanceAdapter, CoingeckoAdapter, YahooAdapter};

// Caching
pub use cache::{CacheFilter, CacheKey, CacheStats, CandleCache, TtlPolicy};

pub use clock::{Clock, ManualClock, SystemClock};

pub use config::{ConfigError, ProviderSettings, RetrievalConfig};

// Domain models
pub use domain::{
    keep_last, normalize, Candle, MarketClass, RawCandle, Symbol, Timeframe, UtcDateTime,
    WireNumber,
};

// Error types
pub use error::{NormalizationError, RetrievalError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Provider contract
pub use provider::{CandleRequest, CandleSource, FetchFuture, ProviderError, ProviderId};

pub use resolver::{FallbackOutcome, FallbackResolver};
pub use response::{CandleResponse, Confidence, MessageCode, ResponseStatus};
pub use retriever::{
    AssetInfo, CandleRetriever, CandleRetrieverBuilder, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use warmup::{spawn_warmup, warmup, WarmupEntry, WarmupReport, WarmupTarget};
