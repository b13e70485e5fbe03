use mosaic_core::{Aggregator, CanonicalProduct, ProviderId, SearchQuery};
use serde::Serialize;

use crate::cli::SingleArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SingleResponseData {
    provider: ProviderId,
    query: SearchQuery,
    products: Vec<CanonicalProduct>,
}

pub async fn run(args: &SingleArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let provider = ProviderId::from(args.provider);
    let query = SearchQuery::parse(&args.query)?;

    let products = aggregator.search_single_provider(provider, &query).await?;

    let data = serde_json::to_value(SingleResponseData {
        provider,
        query,
        products,
    })?;
    Ok(CommandResult::ok(data, vec![provider]))
}
