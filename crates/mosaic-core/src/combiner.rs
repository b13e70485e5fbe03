//! Cross-provider fan-out, merge and balancing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::{FurnishingsAdapter, HandmadeAdapter, HomeGoodsAdapter};
use crate::config::Credentials;
use crate::data_source::ProviderAdapter;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::quota::{QuotaGate, UnlimitedQuota};
use crate::{CanonicalProduct, ConfigError, CoreError, ProviderId, ProviderPolicy, SearchQuery};

pub const DEFAULT_TARGET_SIZE: usize = 1_000;
pub const DEFAULT_PRIMARY_SHARE: f64 = 0.6;

/// Per-provider query lists. A provider with no queries is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ProviderId, Vec<String>>", into = "BTreeMap<ProviderId, Vec<String>>")]
pub struct QueryPlan {
    queries: BTreeMap<ProviderId, Vec<SearchQuery>>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add queries for `provider`; blank entries are discarded.
    pub fn with_queries<I, S>(mut self, provider: ProviderId, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.queries
            .entry(provider)
            .or_default()
            .extend(SearchQuery::parse_all(queries));
        self
    }

    /// Parse a JSON plan such as `{"furnishings": ["sofa"], "handmade": []}`.
    ///
    /// Blank queries are dropped; unknown provider keys are rejected.
    pub fn from_json(input: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn queries(&self, provider: ProviderId) -> &[SearchQuery] {
        self.queries
            .get(&provider)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_queries(&self) -> usize {
        self.queries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_queries() == 0
    }

    /// Merge another plan into this one, appending query lists.
    pub fn merge(mut self, other: QueryPlan) -> Self {
        for (provider, queries) in other.queries {
            self.queries.entry(provider).or_default().extend(queries);
        }
        self
    }
}

impl From<BTreeMap<ProviderId, Vec<String>>> for QueryPlan {
    fn from(value: BTreeMap<ProviderId, Vec<String>>) -> Self {
        value
            .into_iter()
            .fold(Self::new(), |plan, (provider, queries)| plan.with_queries(provider, queries))
    }
}

impl From<QueryPlan> for BTreeMap<ProviderId, Vec<String>> {
    fn from(value: QueryPlan) -> Self {
        value
            .queries
            .into_iter()
            .map(|(provider, queries)| (provider, queries.into_iter().map(String::from).collect()))
            .collect()
    }
}

/// Which provider receives the larger share of the balanced result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimarySelection {
    /// The provider with the most distinct products; ties go to the earlier provider.
    LargestPool,
    Fixed(ProviderId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceConfig {
    pub target_size: usize,
    pub primary_share: f64,
    pub primary: PrimarySelection,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            primary_share: DEFAULT_PRIMARY_SHARE,
            primary: PrimarySelection::LargestPool,
        }
    }
}

impl BalanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size == 0 {
            return Err(ConfigError::InvalidBalance(String::from(
                "target size must be at least 1",
            )));
        }
        if !(0.0..=1.0).contains(&self.primary_share) {
            return Err(ConfigError::InvalidBalance(format!(
                "primary share {} is outside 0..=1",
                self.primary_share
            )));
        }
        Ok(())
    }
}

/// Merge per-provider pools into at most `target_size` products.
///
/// Pools are deduplicated by id across providers (earlier providers win).
/// When the merged pool fits within the target it is returned as-is, in
/// provider order. Otherwise the primary provider contributes
/// `ceil(target * share)` items, the others split the rest evenly, any
/// shortfall is backfilled from providers with surplus, and the selection
/// is shuffled.
pub fn balance(
    pools: Vec<(ProviderId, Vec<CanonicalProduct>)>,
    config: &BalanceConfig,
    rng: &mut fastrand::Rng,
) -> Vec<CanonicalProduct> {
    let target = config.target_size;
    let mut seen = HashSet::new();
    let pools: Vec<(ProviderId, Vec<CanonicalProduct>)> = pools
        .into_iter()
        .map(|(provider, products)| {
            let unique = products
                .into_iter()
                .filter(|product| seen.insert(product.id().to_owned()))
                .collect();
            (provider, unique)
        })
        .collect();

    let total: usize = pools.iter().map(|(_, products)| products.len()).sum();
    if total <= target {
        return pools.into_iter().flat_map(|(_, products)| products).collect();
    }

    let primary = select_primary(&pools, config.primary);
    let quotas = allocate(&pools, primary, target, config.primary_share);

    let mut taken: Vec<usize> = pools
        .iter()
        .zip(&quotas)
        .map(|((_, products), quota)| (*quota).min(products.len()))
        .collect();

    let mut shortfall = target - taken.iter().sum::<usize>();
    for (index, (_, products)) in pools.iter().enumerate() {
        if shortfall == 0 {
            break;
        }
        let extra = (products.len() - taken[index]).min(shortfall);
        taken[index] += extra;
        shortfall -= extra;
    }

    let mut selection: Vec<CanonicalProduct> = pools
        .into_iter()
        .zip(taken)
        .flat_map(|((_, products), count)| products.into_iter().take(count))
        .collect();
    rng.shuffle(&mut selection);
    selection
}

fn select_primary(
    pools: &[(ProviderId, Vec<CanonicalProduct>)],
    selection: PrimarySelection,
) -> ProviderId {
    match selection {
        PrimarySelection::Fixed(provider) => provider,
        PrimarySelection::LargestPool => pools
            .iter()
            .rev()
            .max_by_key(|(_, products)| products.len())
            .map_or(ProviderId::Furnishings, |(provider, _)| *provider),
    }
}

fn allocate(
    pools: &[(ProviderId, Vec<CanonicalProduct>)],
    primary: ProviderId,
    target: usize,
    share: f64,
) -> Vec<usize> {
    let others = pools.iter().filter(|(provider, _)| *provider != primary).count();
    let primary_quota = if others == 0 {
        target
    } else {
        ((target as f64 * share).ceil() as usize).min(target)
    };

    let remainder = target - primary_quota;
    let (even, mut leftover) = if others == 0 {
        (0, 0)
    } else {
        (remainder / others, remainder % others)
    };

    pools
        .iter()
        .map(|(provider, _)| {
            if *provider == primary {
                return primary_quota;
            }
            if leftover > 0 {
                leftover -= 1;
                even + 1
            } else {
                even
            }
        })
        .collect()
}

/// Per-provider status reported by [`Aggregator::snapshots`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub configured: bool,
    pub cooldown_remaining: Option<Duration>,
    pub policy: ProviderPolicy,
}

/// Adapter registry and cross-provider combiner.
pub struct Aggregator {
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
    balance: BalanceConfig,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.id(), adapter))
                .collect(),
            balance: BalanceConfig::default(),
        }
    }

    pub fn with_balance(mut self, balance: BalanceConfig) -> Self {
        self.balance = balance;
        self
    }

    pub fn balance_config(&self) -> &BalanceConfig {
        &self.balance
    }

    pub fn adapter(&self, provider: ProviderId) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider)
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        self.adapters.keys().copied().collect()
    }

    pub fn snapshots(&self) -> Vec<ProviderSnapshot> {
        self.adapters
            .values()
            .map(|adapter| ProviderSnapshot {
                id: adapter.id(),
                configured: adapter.is_configured(),
                cooldown_remaining: adapter.cooldown_remaining(),
                policy: adapter.policy().clone(),
            })
            .collect()
    }

    /// Run every planned provider concurrently and return each provider's
    /// deduplicated pool, in provider order.
    ///
    /// A configuration error from any provider is returned after all
    /// providers have settled.
    pub async fn collect(
        &self,
        plan: &QueryPlan,
    ) -> Result<Vec<(ProviderId, Vec<CanonicalProduct>)>, ConfigError> {
        let mut searches = Vec::new();
        for provider in ProviderId::ALL {
            let queries = plan.queries(provider);
            if queries.is_empty() {
                debug!(provider = %provider, "no queries planned; skipping provider");
                continue;
            }
            let Some(adapter) = self.adapters.get(&provider) else {
                debug!(provider = %provider, "provider is not registered; skipping");
                continue;
            };
            searches.push(async move { (provider, adapter.search_many(queries).await) });
        }

        let mut pools = Vec::with_capacity(searches.len());
        let mut config_error = None;
        for (provider, outcome) in join_all(searches).await {
            match outcome {
                Ok(products) => pools.push((provider, products)),
                Err(error) => {
                    config_error.get_or_insert(error);
                }
            }
        }

        match config_error {
            Some(error) => Err(error),
            None => Ok(pools),
        }
    }

    pub async fn search_all(&self, plan: &QueryPlan) -> Result<Vec<CanonicalProduct>, ConfigError> {
        self.search_all_with_rng(plan, &mut fastrand::Rng::new()).await
    }

    /// Same as [`search_all`](Self::search_all) with a caller-supplied RNG,
    /// which makes the shuffle reproducible.
    pub async fn search_all_with_rng(
        &self,
        plan: &QueryPlan,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<CanonicalProduct>, ConfigError> {
        let pools = self.collect(plan).await?;
        let pooled: usize = pools.iter().map(|(_, products)| products.len()).sum();
        let products = balance(pools, &self.balance, rng);
        info!(
            pooled,
            returned = products.len(),
            target = self.balance.target_size,
            "aggregated search completed"
        );
        Ok(products)
    }

    /// One adapter, one query, no balancing.
    pub async fn search_single_provider(
        &self,
        provider: ProviderId,
        query: &SearchQuery,
    ) -> Result<Vec<CanonicalProduct>, ConfigError> {
        match self.adapters.get(&provider) {
            Some(adapter) => adapter.search_one(query).await,
            None => {
                debug!(provider = %provider, "provider is not registered; returning no results");
                Ok(Vec::new())
            }
        }
    }
}

/// Builder wiring the three marketplace adapters.
///
/// # Example
///
/// ```rust,no_run
/// use mosaic_core::{AggregatorBuilder, QueryPlan, ProviderId};
///
/// # async fn run() -> Result<(), mosaic_core::ConfigError> {
/// let aggregator = AggregatorBuilder::new().with_env_credentials().build()?;
/// let plan = QueryPlan::new().with_queries(ProviderId::Handmade, ["linen napkins"]);
/// let products = aggregator.search_all(&plan).await?;
/// # let _ = products;
/// # Ok(())
/// # }
/// ```
pub struct AggregatorBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    credentials: Credentials,
    quota: Arc<dyn QuotaGate>,
    policies: HashMap<ProviderId, ProviderPolicy>,
    disabled: BTreeSet<ProviderId>,
    balance: BalanceConfig,
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregatorBuilder {
    pub fn new() -> Self {
        Self {
            http_client: None,
            credentials: Credentials::new(),
            quota: Arc::new(UnlimitedQuota),
            policies: HashMap::new(),
            disabled: BTreeSet::new(),
            balance: BalanceConfig::default(),
        }
    }

    /// Defaults to [`ReqwestHttpClient`] when not set.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Read API keys from the environment (see [`crate::config`]).
    pub fn with_env_credentials(mut self) -> Self {
        self.credentials = Credentials::from_env();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_api_key(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_key(provider, key);
        self
    }

    pub fn with_quota_gate(mut self, quota: Arc<dyn QuotaGate>) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.policies.insert(policy.provider_id, policy);
        self
    }

    pub fn with_provider_enabled(mut self, provider: ProviderId, enabled: bool) -> Self {
        if enabled {
            self.disabled.remove(&provider);
        } else {
            self.disabled.insert(provider);
        }
        self
    }

    pub fn with_balance(mut self, balance: BalanceConfig) -> Self {
        self.balance = balance;
        self
    }

    pub fn build(self) -> Result<Aggregator, ConfigError> {
        self.balance.validate()?;

        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

        for provider in ProviderId::ALL {
            if self.disabled.contains(&provider) {
                continue;
            }

            let policy = self
                .policies
                .get(&provider)
                .cloned()
                .unwrap_or_else(|| ProviderPolicy::default_for(provider));
            policy.validate()?;

            let api_key = self.credentials.get(provider).map(str::to_owned);
            let client = Arc::clone(&http_client);
            let quota = Arc::clone(&self.quota);

            let adapter: Arc<dyn ProviderAdapter> = match provider {
                ProviderId::Furnishings => Arc::new(
                    FurnishingsAdapter::new(client)
                        .with_policy(policy)
                        .with_quota_gate(quota)
                        .with_optional_api_key(api_key),
                ),
                ProviderId::Handmade => Arc::new(
                    HandmadeAdapter::new(client)
                        .with_policy(policy)
                        .with_quota_gate(quota)
                        .with_optional_api_key(api_key),
                ),
                ProviderId::HomeGoods => Arc::new(
                    HomeGoodsAdapter::new(client)
                        .with_policy(policy)
                        .with_quota_gate(quota)
                        .with_optional_api_key(api_key),
                ),
            };
            adapters.push(adapter);
        }

        Ok(Aggregator::new(adapters).with_balance(self.balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductDraft;

    fn pool(provider: ProviderId, prefix: &str, count: usize) -> (ProviderId, Vec<CanonicalProduct>) {
        let products = (0..count)
            .map(|index| {
                ProductDraft {
                    id: format!("{prefix}-{index}"),
                    title: format!("{prefix} item {index}"),
                    ..ProductDraft::new(provider)
                }
                .build()
                .expect("valid product")
            })
            .collect();
        (provider, products)
    }

    fn count_from(products: &[CanonicalProduct], provider: ProviderId) -> usize {
        products.iter().filter(|p| p.source() == provider).count()
    }

    fn config(target_size: usize) -> BalanceConfig {
        BalanceConfig {
            target_size,
            ..BalanceConfig::default()
        }
    }

    #[test]
    fn small_pool_is_concatenated_in_provider_order() {
        let pools = vec![
            pool(ProviderId::Furnishings, "a", 2),
            pool(ProviderId::Handmade, "b", 1),
        ];
        let result = balance(pools, &config(10), &mut fastrand::Rng::with_seed(7));
        let ids: Vec<&str> = result.iter().map(CanonicalProduct::id).collect();
        assert_eq!(ids, vec!["a-0", "a-1", "b-0"]);
    }

    #[test]
    fn largest_pool_gets_ceil_of_primary_share() {
        let pools = vec![
            pool(ProviderId::Furnishings, "a", 50),
            pool(ProviderId::Handmade, "b", 80),
            pool(ProviderId::HomeGoods, "c", 50),
        ];
        let result = balance(pools, &config(25), &mut fastrand::Rng::with_seed(1));

        assert_eq!(result.len(), 25);
        assert_eq!(count_from(&result, ProviderId::Handmade), 15);
        assert_eq!(count_from(&result, ProviderId::Furnishings), 5);
        assert_eq!(count_from(&result, ProviderId::HomeGoods), 5);
    }

    #[test]
    fn odd_remainder_goes_to_earlier_provider() {
        let pools = vec![
            pool(ProviderId::Furnishings, "a", 40),
            pool(ProviderId::Handmade, "b", 40),
            pool(ProviderId::HomeGoods, "c", 40),
        ];
        let balance_config = BalanceConfig {
            target_size: 10,
            primary_share: 0.6,
            primary: PrimarySelection::Fixed(ProviderId::HomeGoods),
        };
        let result = balance(pools, &balance_config, &mut fastrand::Rng::with_seed(3));

        assert_eq!(count_from(&result, ProviderId::HomeGoods), 6);
        assert_eq!(count_from(&result, ProviderId::Furnishings), 2);
        assert_eq!(count_from(&result, ProviderId::Handmade), 2);

        let balance_config = BalanceConfig {
            target_size: 13,
            ..balance_config
        };
        let pools = vec![
            pool(ProviderId::Furnishings, "a", 40),
            pool(ProviderId::Handmade, "b", 40),
            pool(ProviderId::HomeGoods, "c", 40),
        ];
        let result = balance(pools, &balance_config, &mut fastrand::Rng::with_seed(3));
        assert_eq!(count_from(&result, ProviderId::HomeGoods), 8);
        assert_eq!(count_from(&result, ProviderId::Furnishings), 3);
        assert_eq!(count_from(&result, ProviderId::Handmade), 2);
    }

    #[test]
    fn shortfall_is_backfilled_in_provider_order() {
        let pools = vec![
            pool(ProviderId::Furnishings, "a", 30),
            pool(ProviderId::Handmade, "b", 1),
            pool(ProviderId::HomeGoods, "c", 30),
        ];
        let result = balance(pools, &config(20), &mut fastrand::Rng::with_seed(11));

        assert_eq!(result.len(), 20);
        assert_eq!(count_from(&result, ProviderId::Handmade), 1);
        // Furnishings is primary (earliest of the tied largest pools): 12, plus
        // the 3 items Handmade could not supply.
        assert_eq!(count_from(&result, ProviderId::Furnishings), 15);
        assert_eq!(count_from(&result, ProviderId::HomeGoods), 4);
    }

    #[test]
    fn duplicate_ids_across_providers_are_removed() {
        let shared = pool(ProviderId::Handmade, "x", 5).1;
        let mut furnishings = pool(ProviderId::Furnishings, "x", 5);
        furnishings.1.extend(pool(ProviderId::Furnishings, "f", 5).1);
        let pools = vec![furnishings, (ProviderId::Handmade, shared)];

        let result = balance(pools, &config(100), &mut fastrand::Rng::with_seed(5));
        assert_eq!(result.len(), 10);
        assert_eq!(count_from(&result, ProviderId::Handmade), 0);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let build = || {
            vec![
                pool(ProviderId::Furnishings, "a", 20),
                pool(ProviderId::HomeGoods, "c", 20),
            ]
        };
        let first = balance(build(), &config(10), &mut fastrand::Rng::with_seed(42));
        let second = balance(build(), &config(10), &mut fastrand::Rng::with_seed(42));
        assert_eq!(first, second);
    }

    #[test]
    fn balance_config_validation() {
        assert!(BalanceConfig::default().validate().is_ok());
        assert!(config(0).validate().is_err());
        let bad_share = BalanceConfig {
            primary_share: 1.5,
            ..BalanceConfig::default()
        };
        assert!(matches!(bad_share.validate(), Err(ConfigError::InvalidBalance(_))));
    }

    #[test]
    fn query_plan_deserializes_and_skips_blank_queries() {
        let plan = QueryPlan::from_json(r#"{"furnishings": ["sofa", " "], "home_goods": []}"#)
            .expect("valid plan");
        assert_eq!(plan.queries(ProviderId::Furnishings).len(), 1);
        assert!(plan.queries(ProviderId::HomeGoods).is_empty());
        assert!(plan.queries(ProviderId::Handmade).is_empty());
        assert_eq!(plan.total_queries(), 1);
    }

    #[test]
    fn query_plan_rejects_unknown_provider_as_serialization_error() {
        let error = QueryPlan::from_json(r#"{"bazaar": ["lamp"]}"#).expect_err("unknown provider");
        assert!(matches!(error, CoreError::Serialization(_)));
    }
}
