//! # Domain Models
//!
//! Canonical domain types shared by every marketplace adapter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CanonicalProduct`] | Immutable, validated product record |
//! | [`ProductDraft`] | Mutable staging record filled in by response mappers |
//! | [`SearchQuery`] | Trimmed, non-empty free-text query |
//!
//! ## Validation
//!
//! Products are validated when a draft is frozen:
//!
//! ```rust
//! use mosaic_core::{ProductDraft, ProviderId, ValidationError};
//!
//! let mut draft = ProductDraft::new(ProviderId::Handmade);
//! draft.id = String::from("1187");
//! assert_eq!(draft.clone().build(), Err(ValidationError::EmptyProductTitle));
//!
//! draft.title = String::from("Stoneware mug");
//! let product = draft.build().expect("valid product");
//! assert_eq!(product.currency(), "USD");
//! ```

mod product;
mod query;

pub use product::{validate_currency_code, CanonicalProduct, ProductDraft, DEFAULT_CURRENCY, MAX_RATING};
pub use query::SearchQuery;
