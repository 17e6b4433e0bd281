use std::sync::Arc;

use crate::adapters::{fetch_body, parse_json, positional_row, PositionalRow};
use crate::config::ProviderSettings;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::provider::{CandleRequest, CandleSource, FetchFuture, ProviderError, ProviderId};
use crate::{keep_last, normalize, Candle, Timeframe};

/// Trading pairs with a known CoinGecko coin id.
const COIN_IDS: [(&str, &str); 5] = [
    ("BTCUSDT", "bitcoin"),
    ("ETHUSDT", "ethereum"),
    ("SOLUSDT", "solana"),
    ("BNBUSDT", "binancecoin"),
    ("XRPUSDT", "ripple"),
];

/// Crypto adapter backed by the CoinGecko `/coins/{id}/ohlc` endpoint.
///
/// Only pairs in a fixed allowlist are served; anything else fails with
/// [`ProviderError::UnsupportedSymbol`] before any request is made. The
/// endpoint carries no volume, so candles come back with `volume == 0`.
#[derive(Clone)]
pub struct CoingeckoAdapter {
    http_client: Arc<dyn HttpClient>,
    settings: ProviderSettings,
    auth: HttpAuth,
}

impl CoingeckoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: ProviderSettings) -> Self {
        let auth = match &settings.api_key {
            Some(key) => HttpAuth::ApiKey {
                header: "x-cg-demo-api-key",
                key: key.clone(),
            },
            None => HttpAuth::Anonymous,
        };
        Self {
            http_client,
            settings,
            auth,
        }
    }

    /// Pairs this adapter can resolve to a coin id.
    pub fn supported_symbols() -> impl Iterator<Item = &'static str> {
        COIN_IDS.iter().map(|(pair, _)| *pair)
    }

    fn coin_id(symbol: &str) -> Option<&'static str> {
        COIN_IDS
            .iter()
            .find(|(pair, _)| *pair == symbol)
            .map(|(_, id)| *id)
    }

    async fn fetch_candles(&self, req: CandleRequest) -> Result<Vec<Candle>, ProviderError> {
        let provider = self.id();
        let coin_id =
            Self::coin_id(req.symbol.as_str()).ok_or_else(|| ProviderError::UnsupportedSymbol {
                provider,
                symbol: req.symbol.as_str().to_owned(),
            })?;

        let endpoint = format!("{}/coins/{}/ohlc", self.settings.base(), coin_id);
        let request = HttpRequest::get(endpoint)
            .with_query("vs_currency", "usd")
            .with_query("days", lookback_days(req.timeframe))
            .with_auth(&self.auth)
            .with_timeout(self.settings.timeout());

        let body = fetch_body(self.http_client.as_ref(), provider, request).await?;
        let rows: Vec<PositionalRow> = parse_json(provider, &body)?;
        let candles = normalize(rows.into_iter().map(positional_row))
            .map_err(|error| ProviderError::from_normalization(provider, error))?;

        Ok(keep_last(candles, req.limit))
    }
}

impl CandleSource for CoingeckoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    fn supports_timeframe(&self, _timeframe: Timeframe) -> bool {
        true
    }

    fn fetch<'a>(&'a self, req: CandleRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_candles(req))
    }
}

/// CoinGecko picks the bucket size from the window length, so the
/// timeframe only selects how far back to look.
fn lookback_days(timeframe: Timeframe) -> u32 {
    match timeframe {
        Timeframe::OneHour => 1,
        Timeframe::FourHours => 30,
        Timeframe::OneDay => 90,
        _ => 2,
    }
}
