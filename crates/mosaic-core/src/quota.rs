//! Quota gate seam.
//!
//! The quota service itself lives outside this crate. Adapters consult it
//! before each logical request and notify it once the request is about to be
//! dispatched.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use crate::ProviderId;

pub type QuotaFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait QuotaGate: Send + Sync {
    /// `false` means the provider's budget is spent and no request may be sent.
    fn check_usage_limit<'a>(&'a self, provider: ProviderId) -> QuotaFuture<'a, bool>;

    /// Record one dispatched request.
    fn increment_usage<'a>(&'a self, provider: ProviderId) -> QuotaFuture<'a, ()>;
}

/// Gate that never denies and keeps no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedQuota;

impl QuotaGate for UnlimitedQuota {
    fn check_usage_limit<'a>(&'a self, _provider: ProviderId) -> QuotaFuture<'a, bool> {
        Box::pin(async { true })
    }

    fn increment_usage<'a>(&'a self, _provider: ProviderId) -> QuotaFuture<'a, ()> {
        Box::pin(async {})
    }
}

/// Process-local counters with optional per-provider limits.
#[derive(Debug, Default)]
pub struct InMemoryQuotaGate {
    limits: HashMap<ProviderId, u64>,
    usage: Mutex<HashMap<ProviderId, u64>>,
}

impl InMemoryQuotaGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, provider: ProviderId, limit: u64) -> Self {
        self.limits.insert(provider, limit);
        self
    }

    pub fn usage(&self, provider: ProviderId) -> u64 {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider)
            .copied()
            .unwrap_or(0)
    }

    pub fn limit(&self, provider: ProviderId) -> Option<u64> {
        self.limits.get(&provider).copied()
    }
}

impl QuotaGate for InMemoryQuotaGate {
    fn check_usage_limit<'a>(&'a self, provider: ProviderId) -> QuotaFuture<'a, bool> {
        let allowed = self
            .limit(provider)
            .map_or(true, |limit| self.usage(provider) < limit);
        Box::pin(async move { allowed })
    }

    fn increment_usage<'a>(&'a self, provider: ProviderId) -> QuotaFuture<'a, ()> {
        *self
            .usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(provider)
            .or_insert(0) += 1;
        Box::pin(async {})
    }
}
