//! Provider adapters.
//!
//! Each adapter owns exactly one upstream wire format and funnels it through
//! [`normalize`](crate::normalize).

mod binance;
mod coingecko;
mod yahoo;

pub use binance::BinanceAdapter;
pub use coingecko::CoingeckoAdapter;
pub use yahoo::YahooAdapter;

use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{ProviderError, ProviderId};
use crate::{RawCandle, WireNumber};

/// Run one GET and hand back the body of a 2xx response.
async fn fetch_body(
    http_client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<String, ProviderError> {
    debug!(provider = provider.as_str(), url = %request.full_url(), "requesting candles");

    let response = http_client.execute(request).await.map_err(|error| {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider,
                message: error.message().to_owned(),
            }
        } else {
            ProviderError::UpstreamError {
                provider,
                status: None,
                message: format!("transport error: {}", error.message()),
            }
        }
    })?;

    if !response.is_success() {
        return Err(ProviderError::UpstreamError {
            provider,
            status: Some(response.status),
            message: summarize_body(&response.body),
        });
    }

    Ok(response.body)
}

fn parse_json<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|error| ProviderError::InvalidPayload {
        provider,
        message: error.to_string(),
    })
}

/// Positional kline row: `[time_ms, open, high, low, close, volume?, ...]`.
type PositionalRow = Vec<Option<WireNumber>>;

fn positional_row(mut row: PositionalRow) -> RawCandle {
    row.truncate(6);
    let mut fields = row.into_iter();
    let ts_ms = fields.next().flatten().and_then(|value| value.as_i64());
    RawCandle {
        ts_ms,
        open: fields.next().flatten(),
        high: fields.next().flatten(),
        low: fields.next().flatten(),
        close: fields.next().flatten(),
        volume: fields.next().flatten(),
    }
}

fn summarize_body(body: &str) -> String {
    const MAX: usize = 160;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::from("empty response body");
    }
    match trimmed.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}
