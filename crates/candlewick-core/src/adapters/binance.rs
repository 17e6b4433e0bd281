use std::sync::Arc;

use crate::adapters::{fetch_body, parse_json, positional_row, PositionalRow};
use crate::config::ProviderSettings;
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{CandleRequest, CandleSource, FetchFuture, ProviderError, ProviderId};
use crate::{keep_last, normalize, Candle, Timeframe};

/// Upper bound Binance accepts for `limit` on `/api/v3/klines`.
pub const MAX_KLINES: usize = 1_000;

const QUOTE_ASSETS: [&str; 9] = [
    "USDT", "USDC", "BUSD", "FDUSD", "BTC", "ETH", "BNB", "EUR", "TRY",
];

/// Crypto adapter backed by the public Binance klines endpoint.
#[derive(Clone)]
pub struct BinanceAdapter {
    http_client: Arc<dyn HttpClient>,
    settings: ProviderSettings,
}

impl BinanceAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: ProviderSettings) -> Self {
        Self {
            http_client,
            settings,
        }
    }

    async fn fetch_candles(&self, req: CandleRequest) -> Result<Vec<Candle>, ProviderError> {
        let provider = self.id();
        let pair = req.symbol.as_str();
        if !is_trading_pair(pair) {
            return Err(ProviderError::UnsupportedSymbol {
                provider,
                symbol: pair.to_owned(),
            });
        }

        let endpoint = format!("{}/api/v3/klines", self.settings.base());
        let request = HttpRequest::get(endpoint)
            .with_query("symbol", pair)
            .with_query("interval", kline_interval(req.timeframe))
            .with_query("limit", req.limit.clamp(1, MAX_KLINES))
            .with_timeout(self.settings.timeout());

        let body = fetch_body(self.http_client.as_ref(), provider, request).await?;
        let rows: Vec<PositionalRow> = parse_json(provider, &body)?;
        let candles = normalize(rows.into_iter().map(positional_row))
            .map_err(|error| ProviderError::from_normalization(provider, error))?;

        Ok(keep_last(candles, req.limit))
    }
}

impl CandleSource for BinanceAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Binance
    }

    fn supports_timeframe(&self, _timeframe: Timeframe) -> bool {
        true
    }

    fn fetch<'a>(&'a self, req: CandleRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_candles(req))
    }
}

/// Binance pairs are bare concatenations like `BTCUSDT`: alphanumeric, with
/// a recognised quote asset and a non-empty base.
fn is_trading_pair(symbol: &str) -> bool {
    if !(5..=20).contains(&symbol.len()) || !symbol.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    QUOTE_ASSETS
        .iter()
        .any(|quote| symbol.len() > quote.len() && symbol.ends_with(quote))
}

fn kline_interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneMonth => "1M",
        other => other.as_str(),
    }
}
