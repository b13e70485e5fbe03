//! Query plan assembly from command-line flags and plan files.

use std::fs;
use std::path::Path;

use mosaic_core::{ProviderId, QueryPlan};

use crate::cli::SearchArgs;
use crate::error::CliError;

/// Read a JSON plan of the form `{"furnishings": ["sofa"], "handmade": []}`.
///
/// Blank queries are dropped; unknown provider keys are rejected.
pub fn load(path: &Path) -> Result<QueryPlan, CliError> {
    let raw = fs::read_to_string(path)?;
    QueryPlan::from_json(&raw).map_err(|source| CliError::Plan {
        path: path.display().to_string(),
        source,
    })
}

/// File plan (if any) merged with the per-provider flags.
pub fn from_args(args: &SearchArgs) -> Result<QueryPlan, CliError> {
    let base = match &args.queries_file {
        Some(path) => load(path)?,
        None => QueryPlan::new(),
    };

    let flags = QueryPlan::new()
        .with_queries(ProviderId::Furnishings, &args.furnishings)
        .with_queries(ProviderId::Handmade, &args.handmade)
        .with_queries(ProviderId::HomeGoods, &args.home_goods);
    let plan = base.merge(flags);

    if plan.is_empty() {
        return Err(CliError::Command(String::from(
            "no queries given; use --furnishings, --handmade, --home-goods or --queries-file",
        )));
    }
    Ok(plan)
}
