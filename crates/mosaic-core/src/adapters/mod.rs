//! Marketplace adapters.
//!
//! Every adapter shares the same request pipeline ([`AdapterCore`]):
//! credential check and cool-down short-circuit, then one task on the
//! adapter's own request queue that re-checks the cool-down, consults the
//! quota gate and runs every retry attempt, then table-driven mapping. The
//! adapters themselves only know their endpoint, auth headers and payload
//! shape.

mod furnishings;
mod handmade;
mod home_goods;
pub mod mapping;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use furnishings::FurnishingsAdapter;
pub use handmade::HandmadeAdapter;
pub use home_goods::HomeGoodsAdapter;

use crate::config::resolve_key;
use crate::cooldown::Cooldown;
use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::quota::{QuotaGate, UnlimitedQuota};
use crate::request_queue::{QueueError, RequestQueue};
use crate::{CanonicalProduct, ConfigError, ProviderId, ProviderPolicy, SearchQuery};

/// State owned by one adapter instance: policy, queue and cool-down.
pub(crate) struct AdapterCore {
    provider: ProviderId,
    policy: ProviderPolicy,
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
    quota: Arc<dyn QuotaGate>,
    queue: RequestQueue,
    cooldown: Arc<Cooldown>,
}

impl AdapterCore {
    pub(crate) fn new(provider: ProviderId, http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::default_for(provider);
        Self {
            provider,
            queue: RequestQueue::new(policy.max_concurrent, policy.inter_batch_delay),
            cooldown: Arc::new(Cooldown::new(policy.auth_cooldown)),
            policy,
            api_key: None,
            http_client,
            quota: Arc::new(UnlimitedQuota),
        }
    }

    pub(crate) fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key;
    }

    /// Replaces the policy and rebuilds the queue and cool-down from it.
    pub(crate) fn set_policy(&mut self, policy: ProviderPolicy) {
        self.queue = RequestQueue::new(policy.max_concurrent, policy.inter_batch_delay);
        self.cooldown = Arc::new(Cooldown::new(policy.auth_cooldown));
        self.policy = ProviderPolicy {
            provider_id: self.provider,
            ..policy
        };
    }

    pub(crate) fn set_quota_gate(&mut self, quota: Arc<dyn QuotaGate>) {
        self.quota = quota;
    }

    pub(crate) fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    pub(crate) fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    pub(crate) fn is_configured(&self) -> bool {
        resolve_key(self.provider, self.api_key.as_deref()).is_ok()
    }

    /// Run one logical search request.
    ///
    /// `build` receives the resolved API key; `map` turns a successful body
    /// into products. Every upstream failure is logged and becomes `[]`.
    pub(crate) async fn search<B, M>(
        &self,
        query: &SearchQuery,
        build: B,
        map: M,
    ) -> Result<Vec<CanonicalProduct>, ConfigError>
    where
        B: FnOnce(&str) -> HttpRequest + Send,
        M: FnOnce(&str) -> Result<Vec<CanonicalProduct>, SourceError> + Send,
    {
        let api_key = resolve_key(self.provider, self.api_key.as_deref())?;

        if let Some(remaining) = self.cooldown.remaining() {
            debug!(
                provider = %self.provider,
                remaining_secs = remaining.as_secs(),
                "provider is cooling down after an authorization failure"
            );
            return Ok(Vec::new());
        }

        let timeout_ms = u64::try_from(self.policy.request_timeout.as_millis()).unwrap_or(u64::MAX);
        let request = build(api_key).with_timeout_ms(timeout_ms);

        let outcome = match self.enqueue(request).await {
            Ok(Dispatch::Skipped) => return Ok(Vec::new()),
            Ok(Dispatch::Completed(response)) => map(&response.body),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(products) => {
                debug!(
                    provider = %self.provider,
                    query = %query,
                    results = products.len(),
                    "query completed"
                );
                Ok(products)
            }
            Err(error) => {
                warn!(
                    provider = %self.provider,
                    query = %query,
                    code = error.code(),
                    error = %error,
                    "query failed; returning no results"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Queue one request. The queued task re-checks the cool-down, consults
    /// the quota gate, then runs every retry attempt while holding its slot.
    async fn enqueue(&self, request: HttpRequest) -> Result<Dispatch, SourceError> {
        let provider = self.provider;
        let client = Arc::clone(&self.http_client);
        let quota = Arc::clone(&self.quota);
        let cooldown = Arc::clone(&self.cooldown);
        let retry = self.policy.retry.clone();
        let timeout = self.policy.request_timeout;

        let task = move || async move {
            if cooldown.is_active() {
                debug!(provider = %provider, "cool-down started while queued; skipping request");
                return Ok(Dispatch::Skipped);
            }
            if !quota.check_usage_limit(provider).await {
                debug!(provider = %provider, "usage limit reached; skipping request");
                return Ok(Dispatch::Skipped);
            }
            quota.increment_usage(provider).await;

            let outcome = retry
                .run(provider, |_| attempt(Arc::clone(&client), request.clone(), timeout))
                .await;

            if let Err(error) = &outcome {
                if error.trips_cooldown() && cooldown.trip() {
                    warn!(
                        provider = %provider,
                        window_secs = cooldown.window().map_or(0, |window| window.as_secs()),
                        "authorization rejected; pausing provider"
                    );
                }
            }
            outcome.map(Dispatch::Completed)
        };

        match self.queue.enqueue(task).await {
            Ok(outcome) => outcome,
            Err(QueueError::Dropped) => Err(SourceError::internal("queued request was dropped")),
        }
    }
}

/// Result of a queued request that did not fail.
enum Dispatch {
    /// Cool-down or quota stopped the request before it reached the network.
    Skipped,
    Completed(HttpResponse),
}

/// One HTTP attempt bounded by the request timeout.
async fn attempt(
    client: Arc<dyn HttpClient>,
    request: HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse, SourceError> {
    match tokio::time::timeout(timeout, client.execute(request)).await {
        Err(_elapsed) => Err(SourceError::transport(format!(
            "request timed out after {}ms",
            timeout.as_millis()
        ))),
        Ok(Err(error)) => Err(SourceError::from(error)),
        Ok(Ok(response)) if response.is_success() => Ok(response),
        Ok(Ok(response)) => Err(SourceError::from_status(response.status, &response.body)),
    }
}
