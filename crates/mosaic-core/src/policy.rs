use std::time::Duration;

use crate::{ConfigError, ProviderId, RetryConfig};

pub const DEFAULT_RESULT_CAP: usize = 500;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(2_500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_AUTH_COOLDOWN: Duration = Duration::from_secs(300);

/// Per-provider throttling and resilience knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub max_concurrent: usize,
    pub inter_batch_delay: Duration,
    pub retry: RetryConfig,
    /// `None` disables the authorization cool-down.
    pub auth_cooldown: Option<Duration>,
    pub result_cap: usize,
    pub request_timeout: Duration,
}

impl ProviderPolicy {
    pub fn furnishings_default() -> Self {
        Self::base(ProviderId::Furnishings)
    }

    pub fn handmade_default() -> Self {
        Self::base(ProviderId::Handmade)
    }

    pub fn home_goods_default() -> Self {
        Self::base(ProviderId::HomeGoods)
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Furnishings => Self::furnishings_default(),
            ProviderId::Handmade => Self::handmade_default(),
            ProviderId::HomeGoods => Self::home_goods_default(),
        }
    }

    fn base(provider_id: ProviderId) -> Self {
        Self {
            provider_id,
            max_concurrent: 1,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            retry: RetryConfig::default(),
            auth_cooldown: Some(DEFAULT_AUTH_COOLDOWN),
            result_cap: DEFAULT_RESULT_CAP,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_auth_cooldown(mut self, window: Option<Duration>) -> Self {
        self.auth_cooldown = window;
        self
    }

    pub fn with_result_cap(mut self, result_cap: usize) -> Self {
        self.result_cap = result_cap;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.max_concurrent == 0 {
            "max_concurrent must be at least 1"
        } else if self.result_cap == 0 {
            "result_cap must be at least 1"
        } else if self.request_timeout.is_zero() {
            "request_timeout must be greater than zero"
        } else if self.auth_cooldown.is_some_and(|window| window.is_zero()) {
            "auth_cooldown must be greater than zero when enabled"
        } else {
            return Ok(());
        };

        Err(ConfigError::InvalidPolicy {
            provider: self.provider_id,
            reason: String::from(reason),
        })
    }
}
