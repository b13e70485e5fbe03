//! Contract every marketplace adapter must honor.

use std::ops::Range;
use std::sync::Arc;

use mosaic_core::{
    ConfigError, FurnishingsAdapter, HandmadeAdapter, HomeGoodsAdapter, HttpResponse,
    InMemoryQuotaGate, ProviderAdapter, ProviderId, QuotaGate, ScriptedHttpClient, SearchQuery,
};

struct ProviderCase {
    id: ProviderId,
    payload: fn(Range<usize>) -> String,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Furnishings,
            payload: furnishings_payload,
        },
        ProviderCase {
            id: ProviderId::Handmade,
            payload: handmade_payload,
        },
        ProviderCase {
            id: ProviderId::HomeGoods,
            payload: home_goods_payload,
        },
    ]
}

fn furnishings_payload(ids: Range<usize>) -> String {
    let items: Vec<_> = ids
        .map(|id| serde_json::json!({"sku": format!("W{id:06}"), "name": format!("Chair {id}"), "price": "$120.00"}))
        .collect();
    serde_json::json!({"response": {"data": {"products": items}}}).to_string()
}

fn handmade_payload(ids: Range<usize>) -> String {
    let items: Vec<_> = ids
        .map(|id| serde_json::json!({"listing_id": id, "title": format!("Mug {id}"), "price": {"amount": 2500, "divisor": 100}}))
        .collect();
    serde_json::json!({"count": items.len(), "results": items}).to_string()
}

fn home_goods_payload(ids: Range<usize>) -> String {
    let items: Vec<_> = ids
        .map(|id| serde_json::json!({"itemId": id.to_string(), "productLabel": format!("Towel {id}"), "pricing": {"value": 19.5}}))
        .collect();
    serde_json::json!({"data": {"products": items}}).to_string()
}

fn build_adapter(
    id: ProviderId,
    client: Arc<ScriptedHttpClient>,
    api_key: Option<&str>,
    quota: Arc<dyn QuotaGate>,
) -> Arc<dyn ProviderAdapter> {
    let api_key = api_key.map(str::to_owned);
    match id {
        ProviderId::Furnishings => Arc::new(
            FurnishingsAdapter::new(client)
                .with_optional_api_key(api_key)
                .with_quota_gate(quota),
        ),
        ProviderId::Handmade => Arc::new(
            HandmadeAdapter::new(client)
                .with_optional_api_key(api_key)
                .with_quota_gate(quota),
        ),
        ProviderId::HomeGoods => Arc::new(
            HomeGoodsAdapter::new(client)
                .with_optional_api_key(api_key)
                .with_quota_gate(quota),
        ),
    }
}

fn query(text: &str) -> SearchQuery {
    SearchQuery::parse(text).expect("valid query")
}

#[tokio::test(start_paused = true)]
async fn search_one_maps_payload_for_all_providers() {
    for case in provider_cases() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            (case.payload)(0..3),
        ))]));
        let adapter = build_adapter(case.id, client.clone(), Some("live-key"), Arc::new(InMemoryQuotaGate::new()));

        let products = adapter
            .search_one(&query("kitchen"))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' failed: {error}", case.id));

        assert_eq!(products.len(), 3, "provider '{}': product count", case.id);
        assert!(
            products.iter().all(|p| p.source() == case.id),
            "provider '{}': source tag",
            case.id
        );
        assert!(
            products.iter().all(|p| p.price() > 0.0 && p.currency() == "USD"),
            "provider '{}': price mapping",
            case.id
        );
        assert_eq!(client.call_count(), 1, "provider '{}': one HTTP call", case.id);
    }
}

#[tokio::test]
async fn missing_credentials_surface_config_error_for_all_providers() {
    for case in provider_cases() {
        let client = Arc::new(ScriptedHttpClient::default());
        let adapter = build_adapter(case.id, client.clone(), None, Arc::new(InMemoryQuotaGate::new()));

        let single = adapter.search_one(&query("lamp")).await;
        let many = adapter.search_many(&[query("lamp"), query("rug")]).await;

        assert!(
            matches!(single, Err(ConfigError::MissingCredential { provider, .. }) if provider == case.id),
            "provider '{}': search_one",
            case.id
        );
        assert!(
            matches!(many, Err(ConfigError::MissingCredential { .. })),
            "provider '{}': search_many",
            case.id
        );
        assert_eq!(client.call_count(), 0, "provider '{}': no network", case.id);
        assert!(!adapter.is_configured());
    }
}

#[tokio::test(start_paused = true)]
async fn search_many_dedupes_and_caps_at_five_hundred() {
    for case in provider_cases() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json((case.payload)(0..300))),
            Ok(HttpResponse::ok_json((case.payload)(200..500))),
            Ok(HttpResponse::ok_json((case.payload)(500..700))),
        ]));
        let adapter = build_adapter(case.id, client.clone(), Some("live-key"), Arc::new(InMemoryQuotaGate::new()));
        let queries = SearchQuery::parse_all(["sofa", "  ", "chair", "table"]);

        let products = adapter.search_many(&queries).await.expect("configured adapter");

        assert_eq!(client.call_count(), 3, "provider '{}': blank query skipped", case.id);
        assert_eq!(products.len(), 500, "provider '{}': capped", case.id);

        let mut ids: Vec<&str> = products.iter().map(|p| p.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 500, "provider '{}': unique ids", case.id);
    }
}

#[tokio::test]
async fn empty_query_list_makes_no_calls() {
    for case in provider_cases() {
        let client = Arc::new(ScriptedHttpClient::default());
        let adapter = build_adapter(case.id, client.clone(), Some("live-key"), Arc::new(InMemoryQuotaGate::new()));

        let products = adapter.search_many(&[]).await.expect("configured adapter");

        assert!(products.is_empty());
        assert_eq!(client.call_count(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn quota_denial_skips_network_and_usage_counts_dispatches() {
    for case in provider_cases() {
        let quota = Arc::new(InMemoryQuotaGate::new().with_limit(case.id, 1));
        let client = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok_json(
            (case.payload)(0..2),
        ))));
        let adapter = build_adapter(case.id, client.clone(), Some("live-key"), quota.clone());

        let first = adapter.search_one(&query("vase")).await.expect("configured");
        let second = adapter.search_one(&query("vase")).await.expect("configured");

        assert_eq!(first.len(), 2, "provider '{}': first query served", case.id);
        assert!(second.is_empty(), "provider '{}': quota exhausted", case.id);
        assert_eq!(client.call_count(), 1, "provider '{}': no call once denied", case.id);
        assert_eq!(quota.usage(case.id), 1, "provider '{}': usage", case.id);
    }
}
