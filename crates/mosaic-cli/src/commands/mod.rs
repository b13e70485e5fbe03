mod providers;
mod search;
mod single;

use std::time::Instant;

use mosaic_core::{Aggregator, AggregatorBuilder, ProviderId};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

pub struct CommandResult {
    pub data: Value,
    pub sources: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, sources: Vec<ProviderId>) -> Self {
        Self { data, sources }
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Search(args) => {
            let aggregator = aggregator(args.target, args.primary.into())?;
            search::run(args, &aggregator).await?
        }
        Command::Single(args) => {
            let aggregator = AggregatorBuilder::new().with_env_credentials().build()?;
            single::run(args, &aggregator).await?
        }
        Command::Providers => {
            let aggregator = AggregatorBuilder::new().with_env_credentials().build()?;
            providers::run(&aggregator)?
        }
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let CommandResult { data, sources } = command_result;

    Ok(Envelope {
        meta: Metadata::new(sources, latency_ms),
        data,
    })
}

fn aggregator(
    target_size: usize,
    primary: mosaic_core::PrimarySelection,
) -> Result<Aggregator, CliError> {
    let balance = mosaic_core::BalanceConfig {
        target_size,
        primary,
        ..mosaic_core::BalanceConfig::default()
    };

    AggregatorBuilder::new()
        .with_env_credentials()
        .with_balance(balance)
        .build()
        .map_err(CliError::from)
}
