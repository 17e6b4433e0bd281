use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{fetch_body, parse_json};
use crate::config::ProviderSettings;
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{CandleRequest, CandleSource, FetchFuture, ProviderError, ProviderId};
use crate::{keep_last, normalize, Candle, RawCandle, Timeframe, UtcDateTime, WireNumber};

const SECONDS_PER_DAY: i64 = 86_400;

/// Equity adapter backed by the Yahoo Finance v8 chart API.
///
/// Serves plain tickers (`AAPL`) and exchange-suffixed listings such as
/// Buenos Aires depositary receipts (`AAPL.BA`).
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    settings: ProviderSettings,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: ProviderSettings) -> Self {
        Self {
            http_client,
            settings,
        }
    }

    async fn fetch_candles(&self, req: CandleRequest) -> Result<Vec<Candle>, ProviderError> {
        let provider = self.id();
        let interval =
            chart_interval(req.timeframe).ok_or(ProviderError::UnsupportedTimeframe {
                provider,
                timeframe: req.timeframe,
            })?;

        let period2 = UtcDateTime::now().unix_timestamp();
        let period1 = period2
            .saturating_sub(lookback_days(req.timeframe, req.limit).saturating_mul(SECONDS_PER_DAY))
            .max(0);

        let endpoint = format!(
            "{}/v8/finance/chart/{}",
            self.settings.base(),
            urlencoding::encode(req.symbol.as_str())
        );
        let request = HttpRequest::get(endpoint)
            .with_query("interval", interval)
            .with_query("period1", period1)
            .with_query("period2", period2)
            .with_query("events", "history")
            .with_query("includeAdjustedClose", "true")
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout(self.settings.timeout());

        let body = fetch_body(self.http_client.as_ref(), provider, request).await?;
        let response: YahooChartResponse = parse_json(provider, &body)?;

        if let Some(error) = response.chart.error {
            return Err(ProviderError::UpstreamError {
                provider,
                status: None,
                message: error.describe(),
            });
        }

        let result = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or(ProviderError::EmptyPayload { provider })?;

        let candles = normalize(result.into_rows())
            .map_err(|error| ProviderError::from_normalization(provider, error))?;

        Ok(keep_last(candles, req.limit))
    }
}

impl CandleSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn supports_timeframe(&self, timeframe: Timeframe) -> bool {
        chart_interval(timeframe).is_some()
    }

    fn fetch<'a>(&'a self, req: CandleRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_candles(req))
    }
}

fn chart_interval(timeframe: Timeframe) -> Option<&'static str> {
    match timeframe {
        Timeframe::OneMinute => Some("1m"),
        Timeframe::FiveMinutes => Some("5m"),
        Timeframe::FifteenMinutes => Some("15m"),
        Timeframe::ThirtyMinutes => Some("30m"),
        Timeframe::OneHour => Some("1h"),
        Timeframe::OneDay => Some("1d"),
        Timeframe::OneWeek => Some("1wk"),
        Timeframe::OneMonth => Some("1mo"),
        _ => None,
    }
}

/// Days of history to request so that `limit` trading-session candles fit.
///
/// Intraday windows are capped by how far back Yahoo keeps that granularity.
fn lookback_days(timeframe: Timeframe, limit: usize) -> i64 {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    match timeframe {
        Timeframe::OneMinute => 7,
        Timeframe::FiveMinutes | Timeframe::FifteenMinutes | Timeframe::ThirtyMinutes => 59,
        Timeframe::OneHour => (limit / 24).saturating_add(7).clamp(30, 729),
        Timeframe::OneWeek => limit.saturating_mul(7).saturating_add(30).max(365),
        Timeframe::OneMonth => limit.saturating_mul(31).saturating_add(30).max(730),
        _ => limit.saturating_add(30).max(365),
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match &self.description {
            Some(description) => format!("{}: {}", self.code, description),
            None => self.code.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooChartResult {
    /// Zip the parallel arrays. Indices missing any OHLC value are skipped;
    /// a missing volume reads as zero.
    fn into_rows(self) -> Vec<RawCandle> {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let at = |column: &[Option<f64>], index: usize| column.get(index).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(index, &seconds)| {
                let open = at(&quote.open, index)?;
                let high = at(&quote.high, index)?;
                let low = at(&quote.low, index)?;
                let close = at(&quote.close, index)?;
                Some(RawCandle {
                    ts_ms: seconds.checked_mul(1_000),
                    open: Some(WireNumber::from(open)),
                    high: Some(WireNumber::from(high)),
                    low: Some(WireNumber::from(low)),
                    close: Some(WireNumber::from(close)),
                    volume: at(&quote.volume, index).map(WireNumber::from),
                })
            })
            .collect()
    }
}
