//! Provider and cache fallback chains.
//!
//! | Market | Attempt order |
//! |--------|---------------|
//! | crypto | CoinGecko, Binance, then `Unavailable` with the last cached close |
//! | equity, depositary receipt | fresh cache, Yahoo, stale cache, then `Unavailable` |
//!
//! Provider failures never escape [`FallbackResolver::resolve`]; they become
//! a [`FallbackOutcome`] variant.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CandleCache};
use crate::provider::{CandleRequest, CandleSource};
use crate::{keep_last, Candle, MarketClass, RetrievalError};

/// Result of one retrieval after every fallback step has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FallbackOutcome {
    /// Data straight from a provider or from an unexpired cache entry.
    Fresh { candles: Vec<Candle> },
    /// Expired cache entry served because the provider failed.
    Stale {
        candles: Vec<Candle>,
        reference_price: f64,
    },
    /// Nothing to serve. Carries the last known close when one is cached.
    Unavailable { reference_price: Option<f64> },
}

impl FallbackOutcome {
    pub fn fresh(candles: Vec<Candle>) -> Self {
        Self::Fresh { candles }
    }

    pub fn candles(&self) -> &[Candle] {
        match self {
            Self::Fresh { candles } | Self::Stale { candles, .. } => candles,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn into_candles(self) -> Vec<Candle> {
        match self {
            Self::Fresh { candles } | Self::Stale { candles, .. } => candles,
            Self::Unavailable { .. } => Vec::new(),
        }
    }

    pub fn reference_price(&self) -> Option<f64> {
        match self {
            Self::Fresh { .. } => None,
            Self::Stale {
                reference_price, ..
            } => Some(*reference_price),
            Self::Unavailable { reference_price } => *reference_price,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fresh { .. } => "fresh",
            Self::Stale { .. } => "stale",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }
}

/// Runs the per-market fallback chain against a shared [`CandleCache`].
#[derive(Clone)]
pub struct FallbackResolver {
    crypto_chain: Vec<Arc<dyn CandleSource>>,
    equity: Arc<dyn CandleSource>,
    cache: CandleCache,
}

impl FallbackResolver {
    /// `crypto_chain` is tried in order; the first success wins.
    pub fn new(
        crypto_chain: Vec<Arc<dyn CandleSource>>,
        equity: Arc<dyn CandleSource>,
        cache: CandleCache,
    ) -> Self {
        Self {
            crypto_chain,
            equity,
            cache,
        }
    }

    pub fn cache(&self) -> &CandleCache {
        &self.cache
    }

    /// Resolve one request to an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::UnsupportedTimeframe`] when no provider in
    /// the market's chain serves the timeframe. Nothing else fails.
    pub async fn resolve(
        &self,
        market: MarketClass,
        request: CandleRequest,
    ) -> Result<FallbackOutcome, RetrievalError> {
        let chain_serves = if market.is_equity_like() {
            self.equity.supports_timeframe(request.timeframe)
        } else {
            self.crypto_chain
                .iter()
                .any(|source| source.supports_timeframe(request.timeframe))
        };
        if !chain_serves {
            return Err(RetrievalError::UnsupportedTimeframe {
                market,
                timeframe: request.timeframe,
            });
        }

        let key = CacheKey::new(market, request.symbol.clone(), request.timeframe);
        let outcome = if market.is_equity_like() {
            self.resolve_equity(key, request).await
        } else {
            self.resolve_crypto(key, request).await
        };
        Ok(outcome)
    }

    async fn resolve_crypto(&self, key: CacheKey, request: CandleRequest) -> FallbackOutcome {
        for source in &self.crypto_chain {
            if !source.supports_timeframe(request.timeframe) {
                debug!(provider = %source.id(), key = %key, "timeframe not served, skipping");
                continue;
            }

            match source.fetch(request.clone()).await {
                Ok(candles) => {
                    info!(provider = %source.id(), key = %key, count = candles.len(), "fetched candles");
                    self.cache.put(key, candles.clone()).await;
                    return FallbackOutcome::fresh(candles);
                }
                Err(error) => {
                    warn!(
                        provider = %source.id(),
                        key = %key,
                        code = error.code(),
                        error = %error,
                        "crypto provider failed"
                    );
                }
            }
        }

        let reference_price = self.cache.get_any(&key).await.as_deref().and_then(last_close);
        warn!(key = %key, reference_price = ?reference_price, "crypto chain exhausted");
        FallbackOutcome::Unavailable { reference_price }
    }

    async fn resolve_equity(&self, key: CacheKey, request: CandleRequest) -> FallbackOutcome {
        if let Some(candles) = self.cache.get_fresh(&key).await {
            debug!(key = %key, "fresh cache hit");
            return FallbackOutcome::fresh(keep_last(candles, request.limit));
        }

        let limit = request.limit;
        match self.equity.fetch(request).await {
            Ok(candles) => {
                info!(provider = %self.equity.id(), key = %key, count = candles.len(), "fetched candles");
                self.cache.put(key, candles.clone()).await;
                return FallbackOutcome::fresh(candles);
            }
            Err(error) => {
                warn!(
                    provider = %self.equity.id(),
                    key = %key,
                    code = error.code(),
                    error = %error,
                    "equity provider failed"
                );
            }
        }

        match self.cache.get_any(&key).await {
            Some(candles) => match last_close(&candles) {
                Some(reference_price) => {
                    info!(key = %key, reference_price, "serving stale cache entry");
                    FallbackOutcome::Stale {
                        candles: keep_last(candles, limit),
                        reference_price,
                    }
                }
                None => FallbackOutcome::Unavailable {
                    reference_price: None,
                },
            },
            None => {
                warn!(key = %key, "equity data unavailable and nothing cached");
                FallbackOutcome::Unavailable {
                    reference_price: None,
                }
            }
        }
    }
}

fn last_close(candles: &[Candle]) -> Option<f64> {
    candles.last().map(|candle| candle.close)
}
