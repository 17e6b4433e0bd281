//! Unified retrieval facade.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::adapters::{BinanceAdapter, CoingeckoAdapter, YahooAdapter};
use crate::cache::CandleCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, RetrievalConfig};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider::{CandleRequest, CandleSource};
use crate::resolver::{FallbackOutcome, FallbackResolver};
use crate::{MarketClass, RetrievalError, Symbol, Timeframe};

/// Largest candle count a single retrieval may ask for.
pub const MAX_LIMIT: usize = 1_000;

/// Candle count used by warm-up and asset lookups.
pub const DEFAULT_LIMIT: usize = 100;

/// Latest known price for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetInfo {
    pub market: MarketClass,
    pub symbol: Symbol,
    pub current_price: Option<f64>,
    pub degraded: bool,
}

/// Entry point for candle retrieval.
///
/// Validates caller input, then hands the request to the
/// [`FallbackResolver`]. Provider trouble never surfaces as an error here.
#[derive(Clone)]
pub struct CandleRetriever {
    resolver: FallbackResolver,
}

impl CandleRetriever {
    pub fn new(resolver: FallbackResolver) -> Self {
        Self { resolver }
    }

    pub fn builder() -> CandleRetrieverBuilder {
        CandleRetrieverBuilder::new()
    }

    /// Production retriever configured from `CANDLEWICK_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::builder().config(RetrievalConfig::from_env()?).build())
    }

    pub fn cache(&self) -> &CandleCache {
        self.resolver.cache()
    }

    /// Retrieve up to `limit` candles, oldest first.
    ///
    /// `market`, `symbol` and `timeframe` are accepted in any casing.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] for an unknown market, a malformed symbol,
    /// an unknown or unserved timeframe, or a limit outside `1..=1000`.
    pub async fn retrieve(
        &self,
        market: &str,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<FallbackOutcome, RetrievalError> {
        let market: MarketClass = market.parse()?;
        let symbol = Symbol::parse(symbol)?;
        let timeframe: Timeframe = timeframe.parse()?;
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(RetrievalError::LimitOutOfRange {
                limit,
                max: MAX_LIMIT,
            });
        }

        debug!(market = %market, symbol = %symbol, timeframe = %timeframe, limit, "retrieving candles");
        self.resolver
            .resolve(market, CandleRequest::new(symbol, timeframe, limit))
            .await
    }

    /// Current price from the daily series.
    ///
    /// When nothing fresh is available the price falls back to the cached
    /// reference price, and `degraded` is set.
    pub async fn asset_info(&self, market: &str, symbol: &str) -> Result<AssetInfo, RetrievalError> {
        let outcome = self.retrieve(market, symbol, "1d", DEFAULT_LIMIT).await?;
        let current_price = match &outcome {
            FallbackOutcome::Fresh { candles } | FallbackOutcome::Stale { candles, .. } => {
                candles.last().map(|candle| candle.close)
            }
            FallbackOutcome::Unavailable { reference_price } => *reference_price,
        };

        Ok(AssetInfo {
            market: market.parse()?,
            symbol: Symbol::parse(symbol)?,
            current_price,
            degraded: !outcome.is_fresh(),
        })
    }
}

/// Wires configuration, transport, clock and cache into a [`CandleRetriever`].
pub struct CandleRetrieverBuilder {
    config: RetrievalConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<CandleCache>,
}

impl Default for CandleRetrieverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleRetrieverBuilder {
    pub fn new() -> Self {
        Self {
            config: RetrievalConfig::default(),
            http_client: None,
            clock: None,
            cache: None,
        }
    }

    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the reqwest transport, e.g. with a scripted client in tests.
    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing cache instead of creating one from the TTL config.
    pub fn cache(mut self, cache: CandleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> CandleRetriever {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()) as Arc<dyn HttpClient>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let cache = self
            .cache
            .unwrap_or_else(|| CandleCache::with_clock(self.config.ttl, clock));

        let crypto_chain: Vec<Arc<dyn CandleSource>> = vec![
            Arc::new(CoingeckoAdapter::new(
                http_client.clone(),
                self.config.coingecko,
            )),
            Arc::new(BinanceAdapter::new(http_client.clone(), self.config.binance)),
        ];
        let equity: Arc<dyn CandleSource> =
            Arc::new(YahooAdapter::new(http_client, self.config.yahoo));

        CandleRetriever::new(FallbackResolver::new(crypto_chain, equity, cache))
    }
}
