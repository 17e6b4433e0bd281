//! Provider contract and error taxonomy.
//!
//! Every upstream (CoinGecko, Binance, Yahoo) implements [`CandleSource`]:
//! one capability, `fetch`, turning a [`CandleRequest`] into canonical
//! candles or a [`ProviderError`].
//!
//! # Error classes
//!
//! | Error | Class | Resolver behavior |
//! |-------|-------|-------------------|
//! | `UnsupportedSymbol` | caller input | next stage, no network call made |
//! | `UnsupportedTimeframe` | caller input | next stage, no network call made |
//! | `Timeout` | network | next stage / stale cache |
//! | `UpstreamError` | network | next stage / stale cache |
//! | `EmptyPayload` | payload | next stage / stale cache |
//! | `InvalidPayload` | payload | next stage / stale cache |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Candle, NormalizationError, Symbol, Timeframe};

/// Canonical provider identifiers used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Coingecko,
    Binance,
    Yahoo,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Coingecko, Self::Binance, Self::Yahoo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coingecko => "coingecko",
            Self::Binance => "binance",
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload for candle fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub limit: usize,
}

impl CandleRequest {
    pub fn new(symbol: Symbol, timeframe: Timeframe, limit: usize) -> Self {
        Self {
            symbol,
            timeframe,
            limit,
        }
    }
}

/// Adapter-level failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{provider} does not support symbol '{symbol}'")]
    UnsupportedSymbol { provider: ProviderId, symbol: String },

    #[error("{provider} does not support timeframe '{timeframe}'")]
    UnsupportedTimeframe {
        provider: ProviderId,
        timeframe: Timeframe,
    },

    #[error("{provider} request timed out: {message}")]
    Timeout { provider: ProviderId, message: String },

    #[error("{provider} upstream error{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    UpstreamError {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} returned no usable candles")]
    EmptyPayload { provider: ProviderId },

    #[error("{provider} payload could not be parsed: {message}")]
    InvalidPayload { provider: ProviderId, message: String },
}

impl ProviderError {
    pub fn from_normalization(provider: ProviderId, error: NormalizationError) -> Self {
        match error {
            NormalizationError::EmptyPayload | NormalizationError::NoValidCandles { .. } => {
                Self::EmptyPayload { provider }
            }
        }
    }

    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::UnsupportedSymbol { provider, .. }
            | Self::UnsupportedTimeframe { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::UpstreamError { provider, .. }
            | Self::EmptyPayload { provider }
            | Self::InvalidPayload { provider, .. } => *provider,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedSymbol { .. } => "provider.unsupported_symbol",
            Self::UnsupportedTimeframe { .. } => "provider.unsupported_timeframe",
            Self::Timeout { .. } => "provider.timeout",
            Self::UpstreamError { .. } => "provider.upstream_error",
            Self::EmptyPayload { .. } => "provider.empty_payload",
            Self::InvalidPayload { .. } => "provider.invalid_payload",
        }
    }

    /// Input the provider rejected before touching the network.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSymbol { .. } | Self::UnsupportedTimeframe { .. }
        )
    }
}

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Candle>, ProviderError>> + Send + 'a>>;

/// Candle provider contract.
///
/// Implementations must be `Send + Sync`; one instance serves every
/// concurrent retrieval. `fetch` makes at most one upstream call and
/// returns candles oldest-first, at most `limit` of them.
pub trait CandleSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Whether `fetch` would accept this timeframe without a network call.
    fn supports_timeframe(&self, timeframe: Timeframe) -> bool;

    /// Fetches recent candles for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the symbol or timeframe is outside this
    /// provider's vocabulary, the call times out, the upstream answers with
    /// a non-success status, or the payload holds no valid candles.
    fn fetch<'a>(&'a self, req: CandleRequest) -> FetchFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_message_includes_status() {
        let error = ProviderError::UpstreamError {
            provider: ProviderId::Binance,
            status: Some(451),
            message: String::from("restricted location"),
        };
        assert_eq!(
            error.to_string(),
            "binance upstream error (status 451): restricted location"
        );
        assert_eq!(error.code(), "provider.upstream_error");
        assert!(!error.is_caller_error());
    }

    #[test]
    fn unsupported_symbol_is_a_caller_error() {
        let error = ProviderError::UnsupportedSymbol {
            provider: ProviderId::Coingecko,
            symbol: String::from("DOGEUSDT"),
        };
        assert!(error.is_caller_error());
        assert_eq!(error.provider(), ProviderId::Coingecko);
    }
}
