use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{NormalizationError, UtcDateTime, ValidationError};

/// Canonical OHLCV candle shared by every provider.
///
/// Deserialization goes through [`Candle::new`], so a decoded candle always
/// satisfies the OHLC invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CandleFields")]
pub struct Candle {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        validate_positive("open", open)?;
        validate_positive("high", high)?;
        validate_positive("low", low)?;
        validate_positive("close", close)?;
        validate_non_negative("volume", volume)?;

        if high < low {
            return Err(ValidationError::InvalidCandleRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidCandleBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

#[derive(Deserialize)]
struct CandleFields {
    ts: UtcDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl TryFrom<CandleFields> for Candle {
    type Error = ValidationError;

    fn try_from(fields: CandleFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.ts,
            fields.open,
            fields.high,
            fields.low,
            fields.close,
            fields.volume,
        )
    }
}

/// A numeric field as providers send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }

    /// Epoch values arrive as integers but are sometimes encoded as floats.
    pub fn as_i64(&self) -> Option<i64> {
        let value = self.as_f64()?;
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            Some(value as i64)
        } else {
            None
        }
    }
}

impl From<f64> for WireNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One provider row before coercion and validation.
///
/// `None` means the provider omitted the field or sent `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandle {
    pub ts_ms: Option<i64>,
    pub open: Option<WireNumber>,
    pub high: Option<WireNumber>,
    pub low: Option<WireNumber>,
    pub close: Option<WireNumber>,
    pub volume: Option<WireNumber>,
}

impl RawCandle {
    fn into_candle(self) -> Result<Candle, ValidationError> {
        let ts_ms = self
            .ts_ms
            .ok_or(ValidationError::NonFiniteValue { field: "ts" })?;
        let ts = UtcDateTime::from_unix_millis(ts_ms)?;

        let volume = match self.volume {
            None => 0.0,
            Some(value) => value
                .as_f64()
                .ok_or(ValidationError::NonFiniteValue { field: "volume" })?,
        };

        Candle::new(
            ts,
            coerce("open", self.open)?,
            coerce("high", self.high)?,
            coerce("low", self.low)?,
            coerce("close", self.close)?,
            volume,
        )
    }
}

/// Coerce raw provider rows into canonical candles, oldest first.
///
/// Rows that fail coercion or the OHLC invariant are dropped individually.
pub fn normalize<I>(rows: I) -> Result<Vec<Candle>, NormalizationError>
where
    I: IntoIterator<Item = RawCandle>,
{
    let mut candles = Vec::new();
    let mut discarded = 0_usize;

    for row in rows {
        match row.into_candle() {
            Ok(candle) => candles.push(candle),
            Err(error) => {
                discarded += 1;
                debug!(error = %error, "discarding malformed candle");
            }
        }
    }

    if candles.is_empty() {
        return Err(if discarded == 0 {
            NormalizationError::EmptyPayload
        } else {
            NormalizationError::NoValidCandles { discarded }
        });
    }

    candles.sort_by_key(|candle| candle.ts);
    Ok(candles)
}

/// Keep only the most recent `limit` candles.
pub fn keep_last(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}

fn coerce(field: &'static str, value: Option<WireNumber>) -> Result<f64, ValidationError> {
    value
        .as_ref()
        .and_then(WireNumber::as_f64)
        .ok_or(ValidationError::NonFiniteValue { field })
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositivePrice { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
