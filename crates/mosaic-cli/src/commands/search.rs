use std::collections::BTreeMap;

use mosaic_core::{Aggregator, CanonicalProduct, ProviderId};
use serde::Serialize;
use tracing::info;

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::plan;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    products: Vec<CanonicalProduct>,
    by_source: BTreeMap<ProviderId, usize>,
}

pub async fn run(args: &SearchArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let plan = plan::from_args(args)?;
    info!(queries = plan.total_queries(), target = args.target, "starting search");

    let products = match args.seed {
        Some(seed) => {
            aggregator
                .search_all_with_rng(&plan, &mut fastrand::Rng::with_seed(seed))
                .await?
        }
        None => aggregator.search_all(&plan).await?,
    };

    let by_source = count_by_source(&products);
    let sources = ProviderId::ALL
        .into_iter()
        .filter(|provider| !plan.queries(*provider).is_empty())
        .collect();

    let data = serde_json::to_value(SearchResponseData {
        products,
        by_source,
    })?;
    Ok(CommandResult::ok(data, sources))
}

fn count_by_source(products: &[CanonicalProduct]) -> BTreeMap<ProviderId, usize> {
    products.iter().fold(BTreeMap::new(), |mut counts, product| {
        *counts.entry(product.source()).or_insert(0) += 1;
        counts
    })
}
