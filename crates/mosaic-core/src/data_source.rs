//! Provider adapter contract and upstream error classification.
//!
//! Every marketplace integration implements [`ProviderAdapter`]. Upstream
//! failures are described by [`SourceError`] inside an adapter and never
//! cross the adapter boundary: a failed query degrades to an empty list.
//! The only error an adapter returns is [`ConfigError`], which signals a
//! local deployment defect such as a missing API key.
//!
//! | Kind | Trigger | Retryable |
//! |------|---------|-----------|
//! | [`RateLimited`](SourceErrorKind::RateLimited) | HTTP 429 | yes |
//! | [`Upstream`](SourceErrorKind::Upstream) | HTTP 5xx | yes |
//! | [`Transport`](SourceErrorKind::Transport) | timeout, connection failure | yes |
//! | [`Unauthorized`](SourceErrorKind::Unauthorized) | HTTP 401/403 | no, arms cool-down |
//! | [`Rejected`](SourceErrorKind::Rejected) | other non-2xx status | no |
//! | [`InvalidResponse`](SourceErrorKind::InvalidResponse) | unparseable payload | no |
//! | [`Internal`](SourceErrorKind::Internal) | queued task dropped | no |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::http_client::{HttpError, HttpErrorKind};
use crate::normalize::{cap, dedupe_by_id};
use crate::{CanonicalProduct, ConfigError, ProviderId, ProviderPolicy, SearchQuery};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    RateLimited,
    Upstream,
    Transport,
    Unauthorized,
    Rejected,
    InvalidResponse,
    Internal,
}

/// Structured upstream error used by the retry policy and cool-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    status: Option<u16>,
    message: String,
    retryable: bool,
}

impl SourceError {
    fn with(kind: SourceErrorKind, status: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            retryable,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::RateLimited, Some(429), message, true)
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::Upstream, Some(status), message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::Transport, None, message, true)
    }

    pub fn unauthorized(status: u16, message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::Unauthorized, Some(status), message, false)
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::Rejected, Some(status), message, false)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::InvalidResponse, None, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with(SourceErrorKind::Internal, None, message, false)
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        let message = if snippet.trim().is_empty() {
            format!("upstream returned status {status}")
        } else {
            format!("upstream returned status {status}: {}", snippet.trim())
        };

        match status {
            429 => Self::rate_limited(message),
            401 | 403 => Self::unauthorized(status, message),
            500..=599 => Self::upstream(status, message),
            _ => Self::rejected(status, message),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Whether this failure should put the adapter into authorization cool-down.
    pub const fn trips_cooldown(&self) -> bool {
        matches!(self.kind, SourceErrorKind::Unauthorized)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Upstream => "source.upstream",
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::Unauthorized => "source.unauthorized",
            SourceErrorKind::Rejected => "source.rejected",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl From<HttpError> for SourceError {
    fn from(error: HttpError) -> Self {
        let retryable = error.retryable();
        let message = match error.kind() {
            HttpErrorKind::Timeout => format!("timed out: {}", error.message()),
            HttpErrorKind::Connect | HttpErrorKind::Other => error.message().to_owned(),
        };
        Self::with(SourceErrorKind::Transport, None, message, retryable)
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by adapter searches.
pub type SearchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<CanonicalProduct>, ConfigError>> + Send + 'a>>;

/// Marketplace adapter contract.
///
/// Implementations own their request queue and cool-down state, so one
/// adapter instance should be shared (via `Arc`) by every caller that talks
/// to the same marketplace.
///
/// # Errors
///
/// Both search methods only fail with [`ConfigError`]. Upstream failures,
/// quota denial and cool-down all yield `Ok(vec![])`.
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    fn policy(&self) -> &ProviderPolicy;

    /// Whether a usable (non-placeholder) credential is present.
    fn is_configured(&self) -> bool;

    /// Time left in the authorization cool-down, if one is active.
    fn cooldown_remaining(&self) -> Option<Duration>;

    /// Search the marketplace for one query.
    fn search_one<'a>(&'a self, query: &'a SearchQuery) -> SearchFuture<'a>;

    /// Run every query concurrently and merge the results.
    ///
    /// Successful results are concatenated in query order, deduplicated by id
    /// and truncated to the policy's result cap. A configuration error from
    /// any query is returned once all queries have settled.
    fn search_many<'a>(&'a self, queries: &'a [SearchQuery]) -> SearchFuture<'a> {
        Box::pin(async move {
            if queries.is_empty() {
                return Ok(Vec::new());
            }

            let outcomes = join_all(queries.iter().map(|query| self.search_one(query))).await;

            let mut merged = Vec::new();
            let mut config_error = None;
            for outcome in outcomes {
                match outcome {
                    Ok(products) => merged.extend(products),
                    Err(error) => {
                        config_error.get_or_insert(error);
                    }
                }
            }
            if let Some(error) = config_error {
                return Err(error);
            }

            let products = cap(dedupe_by_id(merged), self.policy().result_cap);
            debug!(
                provider = %self.id(),
                queries = queries.len(),
                results = products.len(),
                "provider search settled"
            );
            Ok(products)
        })
    }
}
