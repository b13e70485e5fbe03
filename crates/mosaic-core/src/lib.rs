//! # Mosaic Core
//!
//! Multi-marketplace product search: fan out free-text queries to several
//! rate-limited, inconsistently shaped upstream APIs and fan the results back
//! in as one normalized, deduplicated, source-balanced product list.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Marketplace adapters and table-driven response mapping |
//! | [`combiner`] | Cross-provider fan-out, balancing and the aggregator builder |
//! | [`config`] | API credential loading |
//! | [`cooldown`] | Authorization cool-down state |
//! | [`data_source`] | Adapter trait and upstream error classification |
//! | [`domain`] | Canonical product and query types |
//! | [`error`] | Configuration and validation errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalize`] | Deduplication and truncation |
//! | [`policy`] | Per-provider throttling and resilience knobs |
//! | [`quota`] | Quota gate seam |
//! | [`request_queue`] | Per-adapter throttled request queue |
//! | [`retry`] | Retry with exponential backoff |
//! | [`store`] | Persistence seam for saved selections |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / caller   │
//! └────────┬────────┘
//!          │ QueryPlan
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Aggregator    │────▶│ balance/shuffle  │
//! └────────┬────────┘     └──────────────────┘
//!          │ search_many (per provider, concurrently)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ ProviderAdapter │────▶│ cool-down, quota │
//! └────────┬────────┘     └──────────────────┘
//!          │ retry
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  RequestQueue   │────▶│   HttpClient     │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Upstream failures never escape an adapter; they are logged and the query
//! yields no products. The only error surfaced by a search is
//! [`ConfigError`]:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mosaic_core::{AggregatorBuilder, ConfigError, QueryPlan, ProviderId, ScriptedHttpClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let aggregator = AggregatorBuilder::new()
//!     .with_http_client(Arc::new(ScriptedHttpClient::default()))
//!     .build()
//!     .expect("default configuration is valid");
//! let plan = QueryPlan::new().with_queries(ProviderId::Handmade, ["ceramic vase"]);
//!
//! match aggregator.search_all(&plan).await {
//!     Err(ConfigError::MissingCredential { env_var, .. }) => {
//!         assert_eq!(env_var, "MOSAIC_HANDMADE_API_KEY");
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! # }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables and never logged
//! - `Debug` output of credentials and auth headers is redacted

pub mod adapters;
pub mod combiner;
pub mod config;
pub mod cooldown;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod policy;
pub mod quota;
pub mod request_queue;
pub mod retry;
pub mod source;
pub mod store;

// Adapter implementations
pub use adapters::{FurnishingsAdapter, HandmadeAdapter, HomeGoodsAdapter};

// Combiner
pub use combiner::{
    balance, Aggregator, AggregatorBuilder, BalanceConfig, PrimarySelection, ProviderSnapshot,
    QueryPlan,
};

pub use config::Credentials;
pub use cooldown::Cooldown;

// Adapter trait and errors
pub use data_source::{ProviderAdapter, SearchFuture, SourceError, SourceErrorKind};

// Domain models
pub use domain::{CanonicalProduct, ProductDraft, SearchQuery, DEFAULT_CURRENCY, MAX_RATING};

pub use error::{ConfigError, CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

pub use normalize::{cap, dedupe_by_id, normalize};
pub use policy::ProviderPolicy;
pub use quota::{InMemoryQuotaGate, QuotaGate, UnlimitedQuota};
pub use request_queue::{QueueError, RequestQueue};
pub use retry::{Backoff, RetryConfig};
pub use source::ProviderId;
pub use store::{InMemoryProductStore, ProductStore, SavedSelection, SelectionId};
