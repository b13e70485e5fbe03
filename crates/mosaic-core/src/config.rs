//! API credential loading.
//!
//! # Environment Variables
//!
//! | Provider | Primary Env Var | Fallback Env Var |
//! |----------|----------------|------------------|
//! | Furnishings | `MOSAIC_FURNISHINGS_API_KEY` | `FURNISHINGS_API_KEY` |
//! | Handmade | `MOSAIC_HANDMADE_API_KEY` | `HANDMADE_API_KEY` |
//! | Home goods | `MOSAIC_HOME_GOODS_API_KEY` | `HOME_GOODS_API_KEY` |

use std::collections::HashMap;
use std::env;

use crate::{ConfigError, ProviderId};

/// Primary and fallback environment variable names for a provider key.
pub const fn env_vars(provider: ProviderId) -> (&'static str, &'static str) {
    match provider {
        ProviderId::Furnishings => ("MOSAIC_FURNISHINGS_API_KEY", "FURNISHINGS_API_KEY"),
        ProviderId::Handmade => ("MOSAIC_HANDMADE_API_KEY", "HANDMADE_API_KEY"),
        ProviderId::HomeGoods => ("MOSAIC_HOME_GOODS_API_KEY", "HOME_GOODS_API_KEY"),
    }
}

/// Values that show up when a sample `.env` was copied without editing.
pub fn is_placeholder(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    normalized.is_empty()
        || normalized.starts_with("your_")
        || normalized.starts_with("your-")
        || normalized.starts_with('<')
        || matches!(
            normalized.as_str(),
            "changeme" | "change_me" | "placeholder" | "demo" | "xxx" | "todo"
        )
}

/// API keys per provider.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderId, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every provider key from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read keys through `lookup`, trying the primary name first.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Self::new();
        for provider in ProviderId::ALL {
            let (primary, fallback) = env_vars(provider);
            if let Some(key) = lookup(primary).or_else(|| lookup(fallback)) {
                credentials.keys.insert(provider, key);
            }
        }
        credentials
    }

    pub fn with_key(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }

    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.get(provider).is_some_and(|key| !is_placeholder(key))
    }

    /// The usable key for `provider`, or the reason there is none.
    pub fn resolve(&self, provider: ProviderId) -> Result<&str, ConfigError> {
        resolve_key(provider, self.get(provider))
    }
}

pub(crate) fn resolve_key(provider: ProviderId, key: Option<&str>) -> Result<&str, ConfigError> {
    let (env_var, _) = env_vars(provider);
    match key {
        None => Err(ConfigError::MissingCredential { provider, env_var }),
        Some(value) if is_placeholder(value) => {
            Err(ConfigError::PlaceholderCredential { provider, env_var })
        }
        Some(value) => Ok(value.trim()),
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut configured: Vec<_> = self
            .keys
            .keys()
            .filter(|provider| self.is_configured(**provider))
            .map(|provider| provider.as_str())
            .collect();
        configured.sort_unstable();
        f.debug_struct("Credentials")
            .field("configured", &configured)
            .finish()
    }
}
