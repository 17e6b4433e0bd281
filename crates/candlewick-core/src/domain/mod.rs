//! # Domain Models
//!
//! Canonical domain types for candle retrieval.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Candle`] | Validated OHLCV observation |
//! | [`RawCandle`] | Provider row before coercion |
//! | [`MarketClass`] | Crypto, equity or depositary receipt |
//! | [`Symbol`] | Upper-cased ticker or trading pair |
//! | [`Timeframe`] | Candle bucket duration (1m .. 1mo) |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! [`Candle::new`] enforces `low <= open, close <= high` with strictly
//! positive prices. [`normalize`] applies that check per row and drops the
//! rows that fail it:
//!
//! ```rust
//! use candlewick_core::{normalize, RawCandle, WireNumber};
//!
//! let row = RawCandle {
//!     ts_ms: Some(1_704_067_200_000),
//!     open: Some(WireNumber::Text("100".into())),
//!     high: Some(WireNumber::Number(105.0)),
//!     low: Some(WireNumber::Number(95.0)),
//!     close: Some(WireNumber::Number(102.0)),
//!     volume: None,
//! };
//! let candles = normalize(vec![row]).expect("valid row");
//! assert_eq!(candles[0].volume, 0.0);
//! ```

mod candle;
mod market;
mod symbol;
mod timeframe;
mod timestamp;

pub use candle::{keep_last, normalize, Candle, RawCandle, WireNumber};
pub use market::MarketClass;
pub use symbol::Symbol;
pub use timeframe::Timeframe;
pub use timestamp::UtcDateTime;
