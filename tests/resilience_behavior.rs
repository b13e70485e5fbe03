//! Behavior tests for throttling, retry, cool-down and quota handling.
//!
//! All tests run on paused tokio time so multi-second waits complete
//! instantly while still being measurable.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mosaic_core::{
    HandmadeAdapter, HomeGoodsAdapter, HttpClient, HttpError, HttpRequest, HttpResponse,
    InMemoryQuotaGate, ProviderAdapter, ProviderId, ProviderPolicy, QuotaGate, RetryConfig,
    ScriptedHttpClient, SearchQuery,
};
use tokio::time::Instant;

const LISTINGS: &str = r#"{"results": [
    {"listing_id": 1, "title": "Stoneware mug", "price": "28.00"},
    {"listing_id": 2, "title": "Linen apron", "price": "54.00"}
]}"#;

fn query(text: &str) -> SearchQuery {
    SearchQuery::parse(text).expect("valid query")
}

fn handmade(client: Arc<dyn HttpClient>) -> HandmadeAdapter {
    HandmadeAdapter::new(client).with_api_key("handmade-key")
}

/// Transport whose first call hangs past any reasonable timeout.
struct StallingHttpClient {
    calls: AtomicUsize,
    stall: Duration,
}

impl HttpClient for StallingHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let stall = self.stall;
        Box::pin(async move {
            if call == 0 {
                tokio::time::sleep(stall).await;
            }
            Ok(HttpResponse::ok_json(LISTINGS))
        })
    }
}

/// Transport that panics inside the queued task.
struct PanickingHttpClient;

impl HttpClient for PanickingHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async { panic!("transport exploded") })
    }
}

// ============================================================================
// Throttling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn when_many_queries_are_issued_system_spaces_dispatches() {
    // Given: default policy, one request per batch, 2.5s between batches
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok_json(LISTINGS))));
    let adapter = handmade(client.clone());
    let queries = SearchQuery::parse_all(["mug", "apron", "bowl", "vase", "scarf"]);
    let started = Instant::now();

    // When
    let products = adapter.search_many(&queries).await.expect("configured");

    // Then: five dispatches need at least four inter-batch delays
    assert_eq!(client.call_count(), 5);
    assert_eq!(products.len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test(start_paused = true)]
async fn when_upstream_recovers_system_retries_with_exponential_waits() {
    // Given: two 500s, then success
    let client = Arc::new(ScriptedHttpClient::new(vec![
        Ok(HttpResponse::new(500, "")),
        Ok(HttpResponse::new(500, "")),
        Ok(HttpResponse::ok_json(LISTINGS)),
    ]));
    let adapter = handmade(client.clone());
    let started = Instant::now();

    // When
    let products = adapter.search_one(&query("mug")).await.expect("configured");

    // Then: 1s + 2s of backoff, not the queue's inter-batch delay
    assert_eq!(products.len(), 2);
    assert_eq!(client.call_count(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn when_a_query_is_retrying_system_holds_its_queue_slot() {
    // Given: the first query needs three attempts, the second succeeds at once
    let client = Arc::new(ScriptedHttpClient::new(vec![
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::ok_json(LISTINGS)),
        Ok(HttpResponse::ok_json(LISTINGS)),
    ]));
    let adapter = handmade(client.clone());

    // When
    adapter
        .search_many(&SearchQuery::parse_all(["mug", "apron"]))
        .await
        .expect("configured");

    // Then: every attempt for the first query precedes the second query
    let sent: Vec<String> = client
        .requests()
        .iter()
        .filter_map(|request| request.query_param("keywords").map(str::to_owned))
        .collect();
    assert_eq!(sent, vec!["mug", "mug", "mug", "apron"]);
}

#[tokio::test(start_paused = true)]
async fn when_rate_limited_system_retries_then_gives_up_empty() {
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::new(429, "slow down"))));
    let adapter = handmade(client.clone());

    let products = adapter.search_one(&query("mug")).await.expect("configured");

    assert!(products.is_empty());
    assert_eq!(client.call_count(), 4);
    assert_eq!(adapter.cooldown_remaining(), None);
}

#[tokio::test(start_paused = true)]
async fn when_request_is_rejected_system_does_not_retry() {
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::new(404, "no route"))));
    let adapter = handmade(client.clone());

    let products = adapter.search_one(&query("mug")).await.expect("configured");

    assert!(products.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_payload_is_malformed_system_returns_empty_without_retry() {
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok_json("<html>"))));
    let adapter = handmade(client.clone());

    let products = adapter.search_one(&query("mug")).await.expect("configured");

    assert!(products.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_request_times_out_system_retries_it() {
    // Given: the first call stalls for a minute, the timeout is 30s
    let client = Arc::new(StallingHttpClient {
        calls: AtomicUsize::new(0),
        stall: Duration::from_secs(60),
    });
    let adapter = handmade(client.clone());
    let started = Instant::now();

    // When
    let products = adapter.search_one(&query("mug")).await.expect("configured");

    // Then: timeout, 1s backoff, then a successful second attempt
    assert_eq!(products.len(), 2);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(31));
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn when_retry_is_disabled_system_makes_one_attempt() {
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::new(503, ""))));
    let policy = ProviderPolicy::default_for(ProviderId::Handmade).with_retry(RetryConfig::no_retry());
    let adapter = handmade(client.clone()).with_policy(policy);

    let products = adapter.search_one(&query("mug")).await.expect("configured");

    assert!(products.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_transport_task_panics_system_degrades_to_empty() {
    let adapter = handmade(Arc::new(PanickingHttpClient));

    let products = adapter.search_one(&query("mug")).await.expect("configured");

    assert!(products.is_empty());
}

// ============================================================================
// Authorization cool-down
// ============================================================================

#[tokio::test(start_paused = true)]
async fn when_upstream_forbids_access_system_pauses_provider_for_window() {
    // Given: a 403 followed by healthy responses
    let client = Arc::new(
        ScriptedHttpClient::new(vec![Ok(HttpResponse::new(403, "not subscribed"))]).with_fallback(
            Ok(HttpResponse::ok_json(r#"{"products": [{"itemId": "9", "productLabel": "Rug", "price": 80}]}"#)),
        ),
    );
    let adapter = HomeGoodsAdapter::new(client.clone()).with_api_key("home-goods-key");

    // When: the first call is forbidden
    let first = adapter.search_one(&query("rug")).await.expect("configured");

    // Then: later calls inside the window never reach the network
    assert!(first.is_empty());
    assert_eq!(client.call_count(), 1);

    tokio::time::advance(Duration::from_secs(120)).await;
    let during = adapter.search_many(&[query("rug"), query("mat")]).await.expect("configured");
    assert!(during.is_empty());
    assert_eq!(client.call_count(), 1);

    // And: once the window elapses the provider is called again
    tokio::time::advance(Duration::from_secs(181)).await;
    let after = adapter.search_one(&query("rug")).await.expect("configured");
    assert_eq!(after.len(), 1);
    assert_eq!(client.call_count(), 2);
    assert_eq!(adapter.cooldown_remaining(), None);
}

#[tokio::test(start_paused = true)]
async fn when_forbidden_with_requests_queued_system_drops_the_backlog() {
    // Given: every call is rejected and five queries are queued together
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::new(403, "not subscribed"))));
    let adapter = HomeGoodsAdapter::new(client.clone()).with_api_key("home-goods-key");
    let queries = SearchQuery::parse_all(["rug", "mat", "lamp", "vase", "throw"]);

    // When
    let products = adapter.search_many(&queries).await.expect("configured");

    // Then: only the first request reached the network
    assert!(products.is_empty());
    assert_eq!(client.call_count(), 1);
    assert!(adapter.cooldown_remaining().is_some());
}

#[tokio::test(start_paused = true)]
async fn when_cooldown_is_disabled_system_keeps_calling_upstream() {
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::new(401, ""))));
    let policy = ProviderPolicy::default_for(ProviderId::HomeGoods).with_auth_cooldown(None);
    let adapter = HomeGoodsAdapter::new(client.clone())
        .with_api_key("home-goods-key")
        .with_policy(policy);

    adapter.search_one(&query("rug")).await.expect("configured");
    adapter.search_one(&query("rug")).await.expect("configured");

    assert_eq!(client.call_count(), 2);
    assert_eq!(adapter.cooldown_remaining(), None);
}

// ============================================================================
// Quota
// ============================================================================

#[tokio::test(start_paused = true)]
async fn when_quota_is_exhausted_system_makes_no_calls() {
    let quota = Arc::new(InMemoryQuotaGate::new().with_limit(ProviderId::Handmade, 0));
    let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok_json(LISTINGS))));
    let adapter = handmade(client.clone()).with_quota_gate(quota.clone());

    let products = adapter
        .search_many(&SearchQuery::parse_all(["mug", "apron"]))
        .await
        .expect("configured");

    assert!(products.is_empty());
    assert_eq!(client.call_count(), 0);
    assert_eq!(quota.usage(ProviderId::Handmade), 0);
}

#[tokio::test(start_paused = true)]
async fn when_a_query_is_retried_system_counts_usage_once() {
    let quota = Arc::new(InMemoryQuotaGate::new());
    let client = Arc::new(ScriptedHttpClient::new(vec![
        Ok(HttpResponse::new(502, "")),
        Ok(HttpResponse::ok_json(LISTINGS)),
    ]));
    let gate: Arc<dyn QuotaGate> = quota.clone();
    let adapter = handmade(client.clone()).with_quota_gate(gate);

    adapter.search_one(&query("mug")).await.expect("configured");

    assert_eq!(client.call_count(), 2);
    assert_eq!(quota.usage(ProviderId::Handmade), 1);
}
