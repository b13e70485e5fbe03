use mosaic_core::{Aggregator, ProviderId};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ProviderStatus {
    id: ProviderId,
    configured: bool,
    env_var: &'static str,
    cooldown_remaining_secs: Option<u64>,
    max_concurrent: usize,
    inter_batch_delay_ms: u64,
    max_retries: u32,
    result_cap: usize,
    request_timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct ProvidersResponseData {
    providers: Vec<ProviderStatus>,
}

pub fn run(aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let providers = aggregator
        .snapshots()
        .into_iter()
        .map(|snapshot| ProviderStatus {
            id: snapshot.id,
            configured: snapshot.configured,
            env_var: mosaic_core::config::env_vars(snapshot.id).0,
            cooldown_remaining_secs: snapshot.cooldown_remaining.map(|left| left.as_secs()),
            max_concurrent: snapshot.policy.max_concurrent,
            inter_batch_delay_ms: millis(snapshot.policy.inter_batch_delay),
            max_retries: snapshot.policy.retry.max_retries,
            result_cap: snapshot.policy.result_cap,
            request_timeout_ms: millis(snapshot.policy.request_timeout),
        })
        .collect::<Vec<_>>();

    let sources = providers.iter().map(|status| status.id).collect();
    let data = serde_json::to_value(ProvidersResponseData { providers })?;
    Ok(CommandResult::ok(data, sources))
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
