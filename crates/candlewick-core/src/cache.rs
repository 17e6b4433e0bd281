//! In-memory candle cache with per-timeframe TTLs and stale reads.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::ConfigError;
use crate::{Candle, MarketClass, Symbol, Timeframe, ValidationError};

/// Expiry horizon used when `now + ttl` is not representable as an `Instant`.
const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache slot identity. Casing is normalized by the component parsers, so
/// `("crypto", "btcusdt", "1H")` and `("CRYPTO", "BTCUSDT", "1h")` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub market: MarketClass,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
}

impl CacheKey {
    pub fn new(market: MarketClass, symbol: Symbol, timeframe: Timeframe) -> Self {
        Self {
            market,
            symbol,
            timeframe,
        }
    }

    pub fn parse(market: &str, symbol: &str, timeframe: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(
            market.parse()?,
            Symbol::parse(symbol)?,
            timeframe.parse()?,
        ))
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.market, self.symbol, self.timeframe)
    }
}

/// Partial match on cache keys; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheFilter {
    pub market: Option<MarketClass>,
    pub symbol: Option<Symbol>,
    pub timeframe: Option<Timeframe>,
}

impl CacheFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn market(mut self, market: MarketClass) -> Self {
        self.market = Some(market);
        self
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    /// Build a filter from optional raw strings in any casing.
    pub fn parse(
        market: Option<&str>,
        symbol: Option<&str>,
        timeframe: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            market: market.map(str::parse).transpose()?,
            symbol: symbol.map(Symbol::parse).transpose()?,
            timeframe: timeframe.map(str::parse).transpose()?,
        })
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        self.market.map_or(true, |market| market == key.market)
            && self.symbol.as_ref().map_or(true, |symbol| *symbol == key.symbol)
            && self
                .timeframe
                .map_or(true, |timeframe| timeframe == key.timeframe)
    }
}

/// TTL table keyed by timeframe.
///
/// Coarser buckets change more slowly, so the table must be strictly
/// decreasing from daily through four-hour and hourly to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub daily: Duration,
    pub four_hour: Duration,
    pub hourly: Duration,
    pub default: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            daily: Duration::from_secs(1_800),
            four_hour: Duration::from_secs(900),
            hourly: Duration::from_secs(600),
            default: Duration::from_secs(300),
        }
    }
}

impl TtlPolicy {
    pub fn new(
        daily: Duration,
        four_hour: Duration,
        hourly: Duration,
        default: Duration,
    ) -> Result<Self, ConfigError> {
        let policy = Self {
            daily,
            four_hour,
            hourly,
            default,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ladder = [
            ("1d", self.daily),
            ("4h", self.four_hour),
            ("1h", self.hourly),
            ("default", self.default),
        ];

        for pair in ladder.windows(2) {
            let (coarser, coarser_ttl) = pair[0];
            let (finer, finer_ttl) = pair[1];
            if coarser_ttl <= finer_ttl {
                return Err(ConfigError::TtlOutOfOrder {
                    coarser: coarser.to_owned(),
                    coarser_secs: coarser_ttl.as_secs(),
                    finer: finer.to_owned(),
                    finer_secs: finer_ttl.as_secs(),
                });
            }
        }

        Ok(())
    }

    pub fn ttl_for(&self, timeframe: Timeframe) -> Duration {
        match timeframe {
            Timeframe::OneDay => self.daily,
            Timeframe::FourHours => self.four_hour,
            Timeframe::OneHour => self.hourly,
            _ => self.default,
        }
    }
}

/// Point-in-time entry counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    candles: Vec<Candle>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
}

impl CacheInner {
    fn get_fresh(&self, key: &CacheKey, now: Instant) -> Option<Vec<Candle>> {
        self.map.get(key).and_then(|entry| {
            if entry.is_fresh(now) {
                Some(entry.candles.clone())
            } else {
                None
            }
        })
    }

    fn get_any(&self, key: &CacheKey) -> Option<Vec<Candle>> {
        self.map.get(key).map(|entry| entry.candles.clone())
    }

    fn put(&mut self, key: CacheKey, candles: Vec<Candle>, expires_at: Instant) {
        self.map.insert(
            key,
            CacheEntry {
                candles,
                expires_at,
            },
        );
    }

    fn clear(&mut self, filter: &CacheFilter) -> usize {
        let before = self.map.len();
        self.map.retain(|key, _| !filter.matches(key));
        before - self.map.len()
    }

    fn stats(&self, now: Instant) -> CacheStats {
        let fresh_entries = self
            .map
            .values()
            .filter(|entry| entry.is_fresh(now))
            .count();
        CacheStats {
            total_entries: self.map.len(),
            fresh_entries,
            expired_entries: self.map.len() - fresh_entries,
        }
    }
}

/// Thread-safe candle cache shared by every retrieval.
///
/// Expired entries are never evicted on read: they stay available to
/// [`get_any`](Self::get_any) until overwritten or cleared.
#[derive(Debug, Clone)]
pub struct CandleCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
    clock: Arc<dyn Clock>,
    ttl: TtlPolicy,
}

impl Default for CandleCache {
    fn default() -> Self {
        Self::new(TtlPolicy::default())
    }
}

impl CandleCache {
    pub fn new(ttl: TtlPolicy) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::default())),
            clock,
            ttl,
        }
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Candles for `key` if the entry has not expired.
    pub async fn get_fresh(&self, key: &CacheKey) -> Option<Vec<Candle>> {
        let store = self.inner.read().await;
        store.get_fresh(key, self.clock.now())
    }

    /// Candles for `key` regardless of expiry.
    pub async fn get_any(&self, key: &CacheKey) -> Option<Vec<Candle>> {
        let store = self.inner.read().await;
        store.get_any(key)
    }

    /// Overwrite the entry for `key` and restart its TTL.
    pub async fn put(&self, key: CacheKey, candles: Vec<Candle>) {
        let now = self.clock.now();
        let expires_at = now
            .checked_add(self.ttl.ttl_for(key.timeframe))
            .or_else(|| now.checked_add(MAX_ENTRY_TTL))
            .unwrap_or(now);
        let mut store = self.inner.write().await;
        store.put(key, candles, expires_at);
    }

    /// Remove every entry matching `filter` and return how many went.
    pub async fn clear(&self, filter: &CacheFilter) -> usize {
        let mut store = self.inner.write().await;
        store.clear(filter)
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.inner.read().await;
        store.stats(self.clock.now())
    }

    /// Number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::UtcDateTime;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let ts = UtcDateTime::from_unix_millis(1_700_000_000_000 + i as i64 * 60_000)
                    .expect("timestamp");
                Candle::new(ts, *close, close * 1.1, close * 0.9, *close, 10.0).expect("valid")
            })
            .collect()
    }

    fn key(market: &str, symbol: &str, timeframe: &str) -> CacheKey {
        CacheKey::parse(market, symbol, timeframe).expect("valid key")
    }

    #[tokio::test]
    async fn put_then_get_fresh_round_trips() {
        let cache = CandleCache::default();
        let series = candles(&[10.0, 11.0]);

        assert!(cache.get_fresh(&key("crypto", "BTCUSDT", "1h")).await.is_none());
        cache.put(key("crypto", "BTCUSDT", "1h"), series.clone()).await;
        assert_eq!(
            cache.get_fresh(&key("crypto", "BTCUSDT", "1h")).await,
            Some(series)
        );
    }

    #[tokio::test]
    async fn key_casing_variants_share_a_slot() {
        let cache = CandleCache::default();
        cache.put(key("crypto", "btcusdt", "1H"), candles(&[5.0])).await;

        assert!(cache.get_fresh(&key("CRYPTO", "BTCUSDT", "1h")).await.is_some());
        assert_eq!(cache.len().await, 1);
        assert_eq!(key("Crypto", "btcUSDT", "1h").to_string(), "crypto:BTCUSDT:1h");
    }

    #[tokio::test]
    async fn expired_entry_is_still_readable_as_stale() {
        let clock = Arc::new(ManualClock::new());
        let cache = CandleCache::with_clock(TtlPolicy::default(), clock.clone());
        let slot = key("equity", "AAPL", "1d");
        cache.put(slot.clone(), candles(&[150.0])).await;

        clock.advance(Duration::from_secs(1_800));
        assert!(cache.get_fresh(&slot).await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get_fresh(&slot).await.is_none());
        assert_eq!(cache.get_any(&slot).await, Some(candles(&[150.0])));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn put_resets_expiry() {
        let clock = Arc::new(ManualClock::new());
        let cache = CandleCache::with_clock(TtlPolicy::default(), clock.clone());
        let slot = key("crypto", "ETHUSDT", "5m");
        cache.put(slot.clone(), candles(&[1.0])).await;

        clock.advance(Duration::from_secs(400));
        assert!(cache.get_fresh(&slot).await.is_none());

        cache.put(slot.clone(), candles(&[2.0])).await;
        assert_eq!(cache.get_fresh(&slot).await, Some(candles(&[2.0])));
    }

    #[tokio::test]
    async fn clear_honours_partial_filter() {
        let cache = CandleCache::default();
        cache.put(key("crypto", "BTCUSDT", "1h"), candles(&[1.0])).await;
        cache.put(key("crypto", "BTCUSDT", "1d"), candles(&[1.0])).await;
        cache.put(key("equity", "AAPL", "1d"), candles(&[1.0])).await;

        let filter = CacheFilter::parse(None, Some("btcusdt"), None).expect("valid filter");
        assert_eq!(cache.clear(&filter).await, 2);
        assert_eq!(cache.len().await, 1);

        assert_eq!(cache.clear(&CacheFilter::all()).await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn stats_split_fresh_and_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache = CandleCache::with_clock(TtlPolicy::default(), clock.clone());
        cache.put(key("crypto", "BTCUSDT", "1m"), candles(&[1.0])).await;
        cache.put(key("equity", "AAPL", "1d"), candles(&[1.0])).await;

        clock.advance(Duration::from_secs(301));
        assert_eq!(
            cache.stats().await,
            CacheStats {
                total_entries: 2,
                fresh_entries: 1,
                expired_entries: 1,
            }
        );
    }

    #[test]
    fn ttl_table_follows_granularity() {
        let policy = TtlPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.ttl_for(Timeframe::OneDay), Duration::from_secs(1_800));
        assert_eq!(policy.ttl_for(Timeframe::FourHours), Duration::from_secs(900));
        assert_eq!(policy.ttl_for(Timeframe::OneHour), Duration::from_secs(600));
        assert_eq!(policy.ttl_for(Timeframe::FifteenMinutes), Duration::from_secs(300));
    }

    #[test]
    fn ttl_table_out_of_order_is_rejected() {
        let err = TtlPolicy::new(
            Duration::from_secs(600),
            Duration::from_secs(900),
            Duration::from_secs(300),
            Duration::from_secs(60),
        )
        .expect_err("4h longer than 1d");
        assert!(matches!(err, ConfigError::TtlOutOfOrder { ref coarser, .. } if coarser == "1d"));
    }

    #[tokio::test]
    async fn oversized_ttl_never_overflows_on_put() {
        let policy = TtlPolicy::new(
            Duration::MAX,
            Duration::from_secs(u64::MAX / 2),
            Duration::from_secs(600),
            Duration::from_secs(300),
        )
        .expect("ladder is ordered");
        let cache = CandleCache::new(policy);
        let key = CacheKey::parse("equity", "AAPL", "1d").expect("key");

        cache.put(key.clone(), candles(&[150.0])).await;

        assert_eq!(cache.get_fresh(&key).await, Some(candles(&[150.0])));
    }
}
