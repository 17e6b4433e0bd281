//! Best-effort cache warm-up run at process start.

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::retriever::{CandleRetriever, DEFAULT_LIMIT};

/// One instrument to pre-load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmupTarget {
    pub market: String,
    pub symbol: String,
    pub timeframe: String,
}

impl WarmupTarget {
    pub fn new(
        market: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            market: market.into(),
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }

    /// Daily series for the most requested equities and depositary receipts.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("equity", "AAPL", "1d"),
            Self::new("equity", "TSLA", "1d"),
            Self::new("equity", "MSFT", "1d"),
            Self::new("depositary-receipt", "AAPL.BA", "1d"),
        ]
    }
}

/// Per-target result of a warm-up pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmupEntry {
    pub target: WarmupTarget,
    /// `fresh`, `stale`, `unavailable` or `rejected`.
    pub status: &'static str,
    pub candles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarmupReport {
    pub entries: Vec<WarmupEntry>,
}

impl WarmupReport {
    pub fn warmed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == "fresh")
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.warmed()
    }
}

/// Retrieve each target once, in order. Failures are recorded, never raised.
pub async fn warmup(retriever: &CandleRetriever, targets: &[WarmupTarget]) -> WarmupReport {
    let mut report = WarmupReport::default();

    for target in targets {
        let entry = match retriever
            .retrieve(&target.market, &target.symbol, &target.timeframe, DEFAULT_LIMIT)
            .await
        {
            Ok(outcome) => WarmupEntry {
                target: target.clone(),
                status: outcome.label(),
                candles: outcome.candles().len(),
                error: None,
            },
            Err(error) => {
                warn!(symbol = %target.symbol, error = %error, "warm-up target rejected");
                WarmupEntry {
                    target: target.clone(),
                    status: "rejected",
                    candles: 0,
                    error: Some(error.to_string()),
                }
            }
        };
        report.entries.push(entry);
    }

    info!(
        warmed = report.warmed(),
        failed = report.failed(),
        "cache warm-up finished"
    );
    report
}

/// Run [`warmup`] on a background task.
pub fn spawn_warmup(retriever: CandleRetriever, targets: Vec<WarmupTarget>) -> JoinHandle<WarmupReport> {
    tokio::spawn(async move { warmup(&retriever, &targets).await })
}
