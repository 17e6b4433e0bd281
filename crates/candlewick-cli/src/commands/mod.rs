mod asset;
mod candles;
mod warmup;

use candlewick_core::CandleRetriever;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub degraded: bool,
}

impl CommandResult {
    pub fn new(data: Value, degraded: bool) -> Self {
        Self { data, degraded }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let retriever = CandleRetriever::from_env()?;

    match &cli.command {
        Command::Candles(args) => candles::run(args, &retriever).await,
        Command::Asset(args) => asset::run(args, &retriever).await,
        Command::Warmup(args) => warmup::run(args, retriever).await,
    }
}
