use std::sync::Arc;
use std::time::Duration;

use super::mapping::{map_products, FieldTable};
use super::AdapterCore;
use crate::data_source::{ProviderAdapter, SearchFuture, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::quota::QuotaGate;
use crate::{CanonicalProduct, ProviderId, ProviderPolicy, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://home-goods-search.p.rapidapi.com/products/search";
pub const DEFAULT_HOST: &str = "home-goods-search.p.rapidapi.com";
pub const WEB_ORIGIN: &str = "https://www.home-goods.com";
const PAGE_SIZE: &str = "48";

const FIELDS: FieldTable = FieldTable {
    results: &["data.products", "products", "data.items", "items"],
    id: &["itemId", "product_id", "id"],
    title: &["productLabel", "title", "name"],
    price: &["pricing.value", "price.current", "price"],
    currency: &["pricing.currency", "currency"],
    rating: &["ratingsReviews.averageRating", "rating"],
    review_count: &["ratingsReviews.totalReviews", "reviewCount", "reviews"],
    image: &["media.images", "image", "thumbnail"],
    product_url: &["identifiers.canonicalUrl", "productUrl", "url"],
};

/// Home goods marketplace, reached through a RapidAPI proxy.
pub struct HomeGoodsAdapter {
    core: AdapterCore,
    base_url: String,
    host: String,
}

impl HomeGoodsAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::HomeGoods, http_client),
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
            .with_query("query", query.as_str())
            .with_query("page", "1")
            .with_query("pagesize", PAGE_SIZE)
            .with_auth(&HttpAuth::Header {
                name: String::from("x-rapidapi-key"),
                value: api_key.to_owned(),
            })
            .with_header("x-rapidapi-host", &self.host)
    }

    fn map_response(body: &str) -> Result<Vec<CanonicalProduct>, SourceError> {
        map_products(&FIELDS, ProviderId::HomeGoods, WEB_ORIGIN, body)
    }
}

impl ProviderAdapter for HomeGoodsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::HomeGoods
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
