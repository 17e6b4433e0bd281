use candlewick_core::{CandleResponse, CandleRetriever, MarketClass, Symbol, Timeframe};

use crate::cli::CandlesArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CandlesArgs, retriever: &CandleRetriever) -> Result<CommandResult, CliError> {
    let market: MarketClass = args.market.parse()?;
    let symbol = Symbol::parse(&args.symbol)?;
    let timeframe: Timeframe = args.timeframe.parse()?;

    let outcome = retriever
        .retrieve(&args.market, &args.symbol, &args.timeframe, args.limit)
        .await?;

    let degraded = !outcome.is_fresh();
    let response = CandleResponse::from_outcome(market, symbol, timeframe, outcome);
    Ok(CommandResult::new(serde_json::to_value(response)?, degraded))
}
