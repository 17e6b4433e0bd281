//! Runtime configuration.
//!
//! Defaults match the public provider endpoints. Every value can be
//! overridden through environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CANDLEWICK_COINGECKO_URL` | `https://api.coingecko.com/api/v3` |
//! | `CANDLEWICK_COINGECKO_API_KEY` | unset (sent as `x-cg-demo-api-key`) |
//! | `CANDLEWICK_COINGECKO_TIMEOUT_MS` | `15000` |
//! | `CANDLEWICK_BINANCE_URL` | `https://api.binance.com` |
//! | `CANDLEWICK_BINANCE_TIMEOUT_MS` | `10000` |
//! | `CANDLEWICK_YAHOO_URL` | `https://query1.finance.yahoo.com` |
//! | `CANDLEWICK_YAHOO_TIMEOUT_MS` | `15000` |
//! | `CANDLEWICK_TTL_DAILY_SECS` | `1800` |
//! | `CANDLEWICK_TTL_FOUR_HOUR_SECS` | `900` |
//! | `CANDLEWICK_TTL_HOURLY_SECS` | `600` |
//! | `CANDLEWICK_TTL_DEFAULT_SECS` | `300` |

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::cache::TtlPolicy;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

/// Upper bound for `CANDLEWICK_*_TIMEOUT_MS` (two minutes).
pub const MAX_TIMEOUT_MS: u64 = 120_000;

/// Upper bound for `CANDLEWICK_TTL_*_SECS` (one week).
pub const MAX_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration errors surfaced at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be at most {max}, got {value}")]
    NumberOutOfRange {
        var: &'static str,
        value: u64,
        max: u64,
    },

    #[error("{var} must not be empty")]
    EmptyValue { var: &'static str },

    #[error("ttl for '{coarser}' ({coarser_secs}s) is not longer than for finer '{finer}' ({finer_secs}s)")]
    TtlOutOfOrder {
        coarser: String,
        coarser_secs: u64,
        finer: String,
        finer_secs: u64,
    },
}

/// Endpoint, timeout and optional key for one upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub api_key: Option<String>,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms,
            api_key: None,
        }
    }

    pub fn coingecko() -> Self {
        Self::new(DEFAULT_COINGECKO_URL, 15_000)
    }

    pub fn binance() -> Self {
        Self::new(DEFAULT_BINANCE_URL, 10_000)
    }

    pub fn yahoo() -> Self {
        Self::new(DEFAULT_YAHOO_URL, 15_000)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL without a trailing slash, ready for path joining.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Top-level retrieval configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub coingecko: ProviderSettings,
    pub binance: ProviderSettings,
    pub yahoo: ProviderSettings,
    pub ttl: TtlPolicy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            coingecko: ProviderSettings::coingecko(),
            binance: ProviderSettings::binance(),
            yahoo: ProviderSettings::yahoo(),
            ttl: TtlPolicy::default(),
        }
    }
}

impl RetrievalConfig {
    /// Load defaults overridden by `CANDLEWICK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed or out-of-range numbers, empty
    /// URLs or a TTL table that is not ordered by granularity.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_url(&lookup, "CANDLEWICK_COINGECKO_URL", &mut config.coingecko)?;
        override_url(&lookup, "CANDLEWICK_BINANCE_URL", &mut config.binance)?;
        override_url(&lookup, "CANDLEWICK_YAHOO_URL", &mut config.yahoo)?;

        config.coingecko.api_key = non_empty(&lookup, "CANDLEWICK_COINGECKO_API_KEY");

        override_number(&lookup, "CANDLEWICK_COINGECKO_TIMEOUT_MS", MAX_TIMEOUT_MS, &mut config.coingecko.timeout_ms)?;
        override_number(&lookup, "CANDLEWICK_BINANCE_TIMEOUT_MS", MAX_TIMEOUT_MS, &mut config.binance.timeout_ms)?;
        override_number(&lookup, "CANDLEWICK_YAHOO_TIMEOUT_MS", MAX_TIMEOUT_MS, &mut config.yahoo.timeout_ms)?;

        let mut daily = config.ttl.daily.as_secs();
        let mut four_hour = config.ttl.four_hour.as_secs();
        let mut hourly = config.ttl.hourly.as_secs();
        let mut fallback = config.ttl.default.as_secs();
        override_number(&lookup, "CANDLEWICK_TTL_DAILY_SECS", MAX_TTL_SECS, &mut daily)?;
        override_number(&lookup, "CANDLEWICK_TTL_FOUR_HOUR_SECS", MAX_TTL_SECS, &mut four_hour)?;
        override_number(&lookup, "CANDLEWICK_TTL_HOURLY_SECS", MAX_TTL_SECS, &mut hourly)?;
        override_number(&lookup, "CANDLEWICK_TTL_DEFAULT_SECS", MAX_TTL_SECS, &mut fallback)?;

        config.ttl = TtlPolicy::new(
            Duration::from_secs(daily),
            Duration::from_secs(four_hour),
            Duration::from_secs(hourly),
            Duration::from_secs(fallback),
        )?;

        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, var: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn override_url<F>(
    lookup: &F,
    var: &'static str,
    settings: &mut ProviderSettings,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(()),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue { var }),
        Some(value) => {
            settings.base_url = value.trim().to_owned();
            Ok(())
        }
    }
}

fn override_number<F>(
    lookup: &F,
    var: &'static str,
    max: u64,
    target: &mut u64,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(());
    };

    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > max => Err(ConfigError::NumberOutOfRange {
            var,
            value: parsed,
            max,
        }),
        Ok(parsed) if parsed > 0 => {
            *target = parsed;
            Ok(())
        }
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = RetrievalConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config, RetrievalConfig::default());
        assert_eq!(config.binance.timeout_ms, 10_000);
        assert_eq!(config.yahoo.timeout_ms, 15_000);
    }

    #[test]
    fn environment_overrides_urls_timeouts_and_keys() {
        let config = RetrievalConfig::from_lookup(lookup_from(&[
            ("CANDLEWICK_BINANCE_URL", "http://localhost:9000/"),
            ("CANDLEWICK_YAHOO_TIMEOUT_MS", "2500"),
            ("CANDLEWICK_COINGECKO_API_KEY", " demo-key "),
            ("CANDLEWICK_TTL_DAILY_SECS", "3600"),
        ]))
        .expect("valid overrides");

        assert_eq!(config.binance.base(), "http://localhost:9000");
        assert_eq!(config.yahoo.timeout_ms, 2_500);
        assert_eq!(config.coingecko.api_key.as_deref(), Some("demo-key"));
        assert_eq!(config.ttl.daily, Duration::from_secs(3_600));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = RetrievalConfig::from_lookup(lookup_from(&[(
            "CANDLEWICK_BINANCE_TIMEOUT_MS",
            "fast",
        )]))
        .expect_err("must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                var: "CANDLEWICK_BINANCE_TIMEOUT_MS",
                ..
            }
        ));
    }

    #[test]
    fn rejects_ttl_table_out_of_order() {
        let err = RetrievalConfig::from_lookup(lookup_from(&[("CANDLEWICK_TTL_HOURLY_SECS", "7200")]))
            .expect_err("hourly above daily must fail");
        assert!(matches!(err, ConfigError::TtlOutOfOrder { .. }));
    }

    #[test]
    fn rejects_ttl_and_timeout_beyond_bounds() {
        let err = RetrievalConfig::from_lookup(lookup_from(&[(
            "CANDLEWICK_TTL_DAILY_SECS",
            "18446744073709551615",
        )]))
        .expect_err("u64::MAX ttl must fail");
        assert_eq!(
            err,
            ConfigError::NumberOutOfRange {
                var: "CANDLEWICK_TTL_DAILY_SECS",
                value: u64::MAX,
                max: MAX_TTL_SECS,
            }
        );

        let err = RetrievalConfig::from_lookup(lookup_from(&[(
            "CANDLEWICK_YAHOO_TIMEOUT_MS",
            "120001",
        )]))
        .expect_err("timeout above two minutes must fail");
        assert!(matches!(err, ConfigError::NumberOutOfRange { max: MAX_TIMEOUT_MS, .. }));

        let config = RetrievalConfig::from_lookup(lookup_from(&[(
            "CANDLEWICK_TTL_DAILY_SECS",
            "604800",
        )]))
        .expect("one week is the inclusive bound");
        assert_eq!(config.ttl.daily, Duration::from_secs(MAX_TTL_SECS));
    }

    #[test]
    fn rejects_empty_url() {
        let err = RetrievalConfig::from_lookup(lookup_from(&[("CANDLEWICK_YAHOO_URL", "  ")]))
            .expect_err("must fail");
        assert_eq!(
            err,
            ConfigError::EmptyValue {
                var: "CANDLEWICK_YAHOO_URL"
            }
        );
    }
}
