use candlewick_core::{spawn_warmup, CandleRetriever, WarmupTarget};
use tracing::info;

use crate::cli::WarmupArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &WarmupArgs, retriever: CandleRetriever) -> Result<CommandResult, CliError> {
    let targets = if args.targets.is_empty() {
        WarmupTarget::defaults()
    } else {
        args.targets
            .iter()
            .map(|(market, symbol, timeframe)| WarmupTarget::new(market, symbol, timeframe))
            .collect()
    };

    let cache = retriever.cache().clone();
    let report = spawn_warmup(retriever, targets)
        .await
        .map_err(|error| CliError::Task(error.to_string()))?;

    let stats = cache.stats().await;
    info!(
        warmed = report.warmed(),
        failed = report.failed(),
        cached = stats.total_entries,
        "warm-up finished"
    );

    let degraded = report.failed() > 0;
    let data = serde_json::json!({
        "report": report,
        "cache": stats,
    });
    Ok(CommandResult::new(data, degraded))
}
