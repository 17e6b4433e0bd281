use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use candlewick_core::{
    BinanceAdapter, CandleRequest, CandleSource, CoingeckoAdapter, HttpClient, HttpError,
    HttpRequest, HttpResponse, ProviderError, ProviderId, ProviderSettings, Symbol, Timeframe,
    YahooAdapter,
};

const COINGECKO_OHLC: &str = "[
    [1700000000000, 36500.0, 36620.0, 36480.0, 36600.0],
    [1700001800000, 36600.0, 36700.0, 36550.0, 36680.0],
    [1700003600000, 36680.0, 36690.0, 36400.0, 36450.0]
]";

const BINANCE_KLINES: &str = r#"[
    [1700000000000,"36500.0","36620.0","36480.0","36600.0","12.5",1700003599999,"0",10,"0","0","0"],
    [1700003600000,"36600.0","36700.0","36550.0","36680.0","8.0",1700007199999,"0",10,"0","0","0"],
    [1700007200000,"36680.0","36690.0","36400.0","36450.0","9.75",1700010799999,"0",10,"0","0","0"]
]"#;

const YAHOO_CHART: &str = r#"{"chart":{"result":[{
    "timestamp":[1700000000,1700086400,1700172800],
    "indicators":{"quote":[{
        "open":[189.0,190.5,191.0],
        "high":[191.0,192.0,193.5],
        "low":[188.0,189.5,190.0],
        "close":[190.5,191.0,193.0],
        "volume":[50000000,42000000,47000000]
    }]}
}],"error":null}}"#;

const YAHOO_EMPTY: &str =
    r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;

/// Transport that answers with one scripted result and counts calls.
struct ScriptedHttpClient {
    response: Result<HttpResponse, HttpError>,
    calls: Mutex<usize>,
}

impl ScriptedHttpClient {
    fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().expect("call counter")
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        *self.calls.lock().expect("call counter") += 1;
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct ProviderCase {
    id: ProviderId,
    symbol: &'static str,
    payload: &'static str,
    empty_payload: &'static str,
    has_volume: bool,
    last_close: f64,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Coingecko,
            symbol: "BTCUSDT",
            payload: COINGECKO_OHLC,
            empty_payload: "[]",
            has_volume: false,
            last_close: 36_450.0,
        },
        ProviderCase {
            id: ProviderId::Binance,
            symbol: "BTCUSDT",
            payload: BINANCE_KLINES,
            empty_payload: "[]",
            has_volume: true,
            last_close: 36_450.0,
        },
        ProviderCase {
            id: ProviderId::Yahoo,
            symbol: "AAPL",
            payload: YAHOO_CHART,
            empty_payload: YAHOO_EMPTY,
            has_volume: true,
            last_close: 193.0,
        },
    ]
}

fn source_for(id: ProviderId, client: Arc<ScriptedHttpClient>) -> Arc<dyn CandleSource> {
    let settings = ProviderSettings::new("https://upstream.test", 5_000);
    match id {
        ProviderId::Coingecko => {
            Arc::new(CoingeckoAdapter::new(client, settings)) as Arc<dyn CandleSource>
        }
        ProviderId::Binance => Arc::new(BinanceAdapter::new(client, settings)),
        ProviderId::Yahoo => Arc::new(YahooAdapter::new(client, settings)),
    }
}

fn request(symbol: &str, limit: usize) -> CandleRequest {
    CandleRequest::new(
        Symbol::parse(symbol).expect("valid symbol"),
        Timeframe::OneDay,
        limit,
    )
}

#[test]
fn fetch_returns_ordered_valid_candles_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(Ok(HttpResponse::ok_json(case.payload)));
        let source = source_for(case.id, client.clone());
        assert_eq!(source.id(), case.id);

        let candles = block_on(source.fetch(request(case.symbol, 10)))
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        assert_eq!(candles.len(), 3, "provider '{}': candle count", case.id);
        assert_eq!(client.calls(), 1, "provider '{}': one upstream call", case.id);
        for window in candles.windows(2) {
            assert!(window[0].ts < window[1].ts, "provider '{}': ordering", case.id);
        }
        for candle in &candles {
            assert!(candle.high >= candle.open.max(candle.close).max(candle.low));
            assert!(candle.low <= candle.open.min(candle.close).min(candle.high));
            assert_eq!(candle.volume > 0.0, case.has_volume, "provider '{}': volume", case.id);
        }
    }
}

#[test]
fn fetch_respects_limit_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(Ok(HttpResponse::ok_json(case.payload)));
        let candles = block_on(source_for(case.id, client).fetch(request(case.symbol, 2)))
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        assert_eq!(candles.len(), 2, "provider '{}': limit", case.id);
        assert_eq!(candles[1].close, case.last_close, "provider '{}': newest kept", case.id);
    }
}

#[test]
fn timeouts_map_to_timeout_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(Err(HttpError::timeout("deadline elapsed")));
        let error = block_on(source_for(case.id, client).fetch(request(case.symbol, 5)))
            .expect_err("timeout must fail");

        assert_eq!(error.provider(), case.id);
        assert_eq!(error.code(), "provider.timeout", "provider '{}'", case.id);
        assert!(!error.is_caller_error());
    }
}

#[test]
fn server_errors_map_to_upstream_error_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(Ok(HttpResponse::with_status(
            503,
            "service unavailable",
        )));
        let error = block_on(source_for(case.id, client).fetch(request(case.symbol, 5)))
            .expect_err("503 must fail");

        assert!(
            matches!(
                error,
                ProviderError::UpstreamError {
                    status: Some(503),
                    ..
                }
            ),
            "provider '{}': {error:?}",
            case.id
        );
    }
}

#[test]
fn empty_payloads_map_to_empty_payload_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(Ok(HttpResponse::ok_json(case.empty_payload)));
        let error = block_on(source_for(case.id, client).fetch(request(case.symbol, 5)))
            .expect_err("empty payload must fail");

        assert_eq!(
            error,
            ProviderError::EmptyPayload { provider: case.id },
            "provider '{}'",
            case.id
        );
    }
}

#[test]
fn malformed_rows_are_dropped_not_fatal() {
    let payload = r#"[
        [1700000000000,"10","9","11","10","1"],
        [1700003600000,"abc","11","9","10","1"],
        [1700007200000,"10","12","9","11","1"]
    ]"#;
    let client = ScriptedHttpClient::new(Ok(HttpResponse::ok_json(payload)));
    let candles = block_on(source_for(ProviderId::Binance, client).fetch(request("ETHUSDT", 10)))
        .expect("one valid row survives");

    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].close, 11.0);
}

fn block_on<F: Future>(future: F) -> F::Output {
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = Box::pin(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: the vtable functions never dereference the data pointer.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_WAKER_VTABLE)
}

unsafe fn noop_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop(_: *const ()) {}

static NOOP_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(noop_clone, noop, noop, noop);
