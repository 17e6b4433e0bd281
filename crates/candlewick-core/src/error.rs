use thiserror::Error;

/// Validation and contract errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or digit: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error(
        "invalid timeframe '{value}', expected one of 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 1d, 3d, 1w, 1mo"
    )]
    InvalidTimeframe { value: String },
    #[error("invalid market '{value}', expected one of crypto, equity, depositary-receipt")]
    InvalidMarket { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp {value} ms is outside the representable range")]
    TimestampOutOfRange { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be strictly positive")]
    NonPositivePrice { field: &'static str },

    #[error("candle high must be >= low")]
    InvalidCandleRange,
    #[error("candle open/close must be within high/low range")]
    InvalidCandleBounds,
}

/// Failure to turn a provider payload into at least one canonical candle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("provider payload contained no candles")]
    EmptyPayload,
    #[error("all {discarded} candle(s) in the provider payload were invalid")]
    NoValidCandles { discarded: usize },
}

/// Caller-input failure raised by the retrieval facade before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("limit {limit} is out of range, expected 1..={max}")]
    LimitOutOfRange { limit: usize, max: usize },

    /// No provider in the market's chain has the bucket. Equity and
    /// depositary-receipt requests for `3m`, `2h`, `4h`, `6h`, `8h`, `12h`
    /// and `3d` end here rather than in a degraded outcome.
    #[error("timeframe '{timeframe}' is not served for {market} markets")]
    UnsupportedTimeframe {
        market: crate::MarketClass,
        timeframe: crate::Timeframe,
    },
}

impl RetrievalError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::InvalidMarket { .. }) => "retrieval.invalid_market",
            Self::Validation(ValidationError::InvalidTimeframe { .. }) => {
                "retrieval.invalid_timeframe"
            }
            Self::Validation(_) => "retrieval.invalid_symbol",
            Self::LimitOutOfRange { .. } => "retrieval.limit_out_of_range",
            Self::UnsupportedTimeframe { .. } => "retrieval.unsupported_timeframe",
        }
    }
}
