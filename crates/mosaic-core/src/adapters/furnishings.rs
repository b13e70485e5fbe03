use std::sync::Arc;
use std::time::Duration;

use super::mapping::{map_products, FieldTable};
use super::AdapterCore;
use crate::data_source::{ProviderAdapter, SearchFuture, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::quota::QuotaGate;
use crate::{CanonicalProduct, ProviderId, ProviderPolicy, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://furnishings-search.p.rapidapi.com/search";
pub const DEFAULT_HOST: &str = "furnishings-search.p.rapidapi.com";
pub const WEB_ORIGIN: &str = "https://www.furnishings-market.com";

const FIELDS: FieldTable = FieldTable {
    results: &["response.data.products", "data.products", "products", "results", ""],
    id: &["sku", "product_id", "id"],
    title: &["name", "product_name", "title"],
    price: &[
        "price.current_price",
        "pricing.customer_price.unit_price.value",
        "sale_price",
        "price",
    ],
    currency: &["price.currency", "currency"],
    rating: &["review_rating", "rating.average", "rating"],
    review_count: &["review_count", "rating.count", "reviews"],
    image: &["image_url", "lead_image", "images", "image"],
    product_url: &["url", "product_url", "link"],
};

/// Furniture and decor marketplace, reached through a RapidAPI proxy.
pub struct FurnishingsAdapter {
    core: AdapterCore,
    base_url: String,
    host: String,
}

impl FurnishingsAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::Furnishings, http_client),
            base_url: String::from(DEFAULT_BASE_URL),
            host: String::from(DEFAULT_HOST),
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

    pub fn with_base_url(mut self, base_url: impl Into<String>, host: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.host = host.into();
        self
    }

    fn build_request(&self, query: &SearchQuery, api_key: &str) -> HttpRequest {
        HttpRequest::get(&self.base_url)
            .with_query("keyword", query.as_str())
            .with_query("page", "1")
            .with_query("sortby", "0")
            .with_auth(&HttpAuth::Header {
                name: String::from("x-rapidapi-key"),
                value: api_key.to_owned(),
            })
            .with_header("x-rapidapi-host", &self.host)
    }

    fn map_response(body: &str) -> Result<Vec<CanonicalProduct>, SourceError> {
        map_products(&FIELDS, ProviderId::Furnishings, WEB_ORIGIN, body)
    }
}

impl ProviderAdapter for FurnishingsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Furnishings
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
