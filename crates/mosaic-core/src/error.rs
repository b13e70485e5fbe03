use thiserror::Error;

use crate::ProviderId;

/// Validation errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("product id cannot be empty")]
    EmptyProductId,
    #[error("product title cannot be empty")]
    EmptyProductTitle,
    #[error("search query cannot be empty")]
    EmptyQuery,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("rating {value} is outside the 0..=5 range")]
    RatingOutOfRange { value: String },

    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("invalid provider '{value}', expected one of furnishings, handmade, home_goods")]
    InvalidProvider { value: String },
}

/// Local deployment defects. This is the only error class that escapes the
/// search pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{provider} credentials are not configured (set {env_var})")]
    MissingCredential {
        provider: ProviderId,
        env_var: &'static str,
    },

    #[error("{provider} credential looks like a placeholder value (set {env_var})")]
    PlaceholderCredential {
        provider: ProviderId,
        env_var: &'static str,
    },

    #[error("invalid policy for {provider}: {reason}")]
    InvalidPolicy {
        provider: ProviderId,
        reason: String,
    },

    #[error("invalid balance configuration: {0}")]
    InvalidBalance(String),
}

/// Top-level error type for library callers, returned by parsing entry
/// points such as [`QueryPlan::from_json`](crate::QueryPlan::from_json).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
