use candlewick_core::CandleRetriever;

use crate::cli::AssetArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &AssetArgs, retriever: &CandleRetriever) -> Result<CommandResult, CliError> {
    let info = retriever.asset_info(&args.market, &args.symbol).await?;
    let degraded = info.degraded;
    Ok(CommandResult::new(serde_json::to_value(info)?, degraded))
}
