use std::sync::Arc;
use std::time::Duration;

use super::mapping::{map_products, FieldTable};
use super::AdapterCore;
use crate::data_source::{ProviderAdapter, SearchFuture, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::quota::QuotaGate;
use crate::{CanonicalProduct, ProviderId, ProviderPolicy, SearchQuery};

pub const DEFAULT_BASE_URL: &str =
    "https://openapi.handmade-market.com/v3/application/listings/active";
pub const WEB_ORIGIN: &str = "https://www.handmade-market.com";
const PAGE_SIZE: &str = "100";

const FIELDS: FieldTable = FieldTable {
    results: &["results", "listings", "data"],
    id: &["listing_id", "id"],
    title: &["title", "name"],
    price: &["price", "original_price"],
    currency: &["price.currency_code", "currency_code"],
    rating: &["shop.review_average", "rating"],
    review_count: &["shop.review_count", "num_reviews"],
    image: &["images", "Images", "image_url"],
    product_url: &["url", "listing_url"],
};

/// Handmade goods marketplace, keyed with a plain `x-api-key` header.
pub struct HandmadeAdapter {
    core: AdapterCore,
    base_url: String,
}

impl HandmadeAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::Handmade, http_client),
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.core.set_api_key(Some(api_key.into()));
        self
    }

    pub fn with_optional_api_key(mut self, api_key: Option<String>) -> Self {
        self.core.set_api_key(api_key);
        self
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.core.set_policy(policy);
        self
    }

    pub fn with_quota_gate(mut self, quota: Arc<dyn QuotaGate>) -> Self {
        self.core.set_quota_gate(quota);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, query: &SearchQuery, api_key: &str) -> HttpRequest {
        HttpRequest::get(&self.base_url)
            .with_query("keywords", query.as_str())
            .with_query("limit", PAGE_SIZE)
            .with_query("offset", "0")
            .with_auth(&HttpAuth::Header {
                name: String::from("x-api-key"),
                value: api_key.to_owned(),
            })
    }

    fn map_response(body: &str) -> Result<Vec<CanonicalProduct>, SourceError> {
        map_products(&FIELDS, ProviderId::Handmade, WEB_ORIGIN, body)
    }
}

impl ProviderAdapter for HandmadeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Handmade
    }

    fn policy(&self) -> &ProviderPolicy {
        self.core.policy()
    }

    fn is_configured(&self) -> bool {
        self.core.is_configured()
    }

    fn cooldown_remaining(&self) -> Option<Duration> {
        self.core.cooldown().remaining()
    }

    fn search_one<'a>(&'a self, query: &'a SearchQuery) -> SearchFuture<'a> {
        Box::pin(self.core.search(
            query,
            move |api_key| self.build_request(query, api_key),
            Self::map_response,
        ))
    }
}
