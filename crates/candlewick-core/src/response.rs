//! Client-facing rendering of a [`FallbackOutcome`].
//!
//! Every outcome renders to a well-formed body; degraded and unavailable
//! data are labelled rather than reported as server errors.

use serde::Serialize;

use crate::resolver::FallbackOutcome;
use crate::{Candle, MarketClass, Symbol, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Degraded,
    DataTemporarilyUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    DataSourceError,
    DataSourceRateLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleResponse {
    pub status: ResponseStatus,
    pub market: MarketClass,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    pub reference_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_code: Option<MessageCode>,
    pub confidence: Confidence,
    pub cache_available: bool,
}

impl CandleResponse {
    pub fn from_outcome(
        market: MarketClass,
        symbol: Symbol,
        timeframe: Timeframe,
        outcome: FallbackOutcome,
    ) -> Self {
        let unavailable_code = if market.is_equity_like() {
            MessageCode::DataSourceRateLimit
        } else {
            MessageCode::DataSourceError
        };

        let (status, message_code, confidence, cache_available) = match &outcome {
            FallbackOutcome::Fresh { .. } => (ResponseStatus::Ok, None, Confidence::High, true),
            FallbackOutcome::Stale { .. } => (
                ResponseStatus::Degraded,
                Some(MessageCode::DataSourceRateLimit),
                Confidence::Medium,
                true,
            ),
            FallbackOutcome::Unavailable { reference_price } => (
                ResponseStatus::DataTemporarilyUnavailable,
                Some(unavailable_code),
                Confidence::Low,
                reference_price.is_some(),
            ),
        };
        let reference_price = outcome.reference_price();

        Self {
            status,
            market,
            symbol,
            timeframe,
            candles: outcome.into_candles(),
            reference_price,
            message_code,
            confidence,
            cache_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::UtcDateTime;

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("symbol")
    }

    #[test]
    fn unavailable_crypto_renders_source_error() {
        let response = CandleResponse::from_outcome(
            MarketClass::Crypto,
            symbol("BTCUSDT"),
            Timeframe::OneHour,
            FallbackOutcome::Unavailable {
                reference_price: None,
            },
        );
        let body = serde_json::to_value(&response).expect("serializable");

        assert_eq!(body["status"], json!("data_temporarily_unavailable"));
        assert_eq!(body["message_code"], json!("DATA_SOURCE_ERROR"));
        assert_eq!(body["confidence"], json!("LOW"));
        assert_eq!(body["candles"], json!([]));
        assert_eq!(body["reference_price"], json!(null));
        assert_eq!(body["cache_available"], json!(false));
    }

    #[test]
    fn stale_equity_renders_degraded_with_reference() {
        let ts = UtcDateTime::from_unix_millis(1_700_000_000_000).expect("ts");
        let candle = Candle::new(ts, 149.0, 151.0, 148.0, 150.0, 1_000.0).expect("candle");
        let response = CandleResponse::from_outcome(
            MarketClass::Equity,
            symbol("AAPL"),
            Timeframe::OneDay,
            FallbackOutcome::Stale {
                candles: vec![candle],
                reference_price: 150.0,
            },
        );
        let body = serde_json::to_value(&response).expect("serializable");

        assert_eq!(body["status"], json!("degraded"));
        assert_eq!(body["market"], json!("equity"));
        assert_eq!(body["timeframe"], json!("1d"));
        assert_eq!(body["reference_price"], json!(150.0));
        assert_eq!(body["confidence"], json!("MEDIUM"));
        assert_eq!(body["message_code"], json!("DATA_SOURCE_RATE_LIMIT"));
        assert_eq!(body["candles"][0]["close"], json!(150.0));
    }

    #[test]
    fn fresh_renders_ok_without_message_code() {
        let response = CandleResponse::from_outcome(
            MarketClass::DepositaryReceipt,
            symbol("AAPL.BA"),
            Timeframe::OneDay,
            FallbackOutcome::fresh(Vec::new()),
        );
        let body = serde_json::to_value(&response).expect("serializable");
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["confidence"], json!("HIGH"));
        assert!(body.get("message_code").is_none());
    }
}
