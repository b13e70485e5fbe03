use serde::{Deserialize, Serialize};

use crate::{ProviderId, ValidationError};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const MAX_RATING: f64 = 5.0;

/// Unified, source-agnostic product record.
///
/// Fields are private; the only ways to obtain a value are
/// [`ProductDraft::build`] and deserialization, both of which validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProductDraft")]
pub struct CanonicalProduct {
    id: String,
    title: String,
    price: f64,
    currency: String,
    rating: f64,
    review_count: u64,
    image_url: String,
    product_url: String,
    source: ProviderId,
}

impl CanonicalProduct {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn review_count(&self) -> u64 {
        self.review_count
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn product_url(&self) -> &str {
        &self.product_url
    }

    pub fn source(&self) -> ProviderId {
        self.source
    }
}

/// Mutable staging record filled in by response mappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub source: ProviderId,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
}

impl ProductDraft {
    pub fn new(source: ProviderId) -> Self {
        Self {
            source,
            id: String::new(),
            title: String::new(),
            price: 0.0,
            currency: None,
            rating: 0.0,
            review_count: 0,
            image_url: String::new(),
            product_url: String::new(),
        }
    }

    /// Validate the draft and freeze it into a [`CanonicalProduct`].
    pub fn build(self) -> Result<CanonicalProduct, ValidationError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyProductId);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyProductTitle);
        }

        validate_non_negative("price", self.price)?;
        validate_non_negative("rating", self.rating)?;
        if self.rating > MAX_RATING {
            return Err(ValidationError::RatingOutOfRange {
                value: self.rating.to_string(),
            });
        }

        let currency = match self.currency.as_deref() {
            Some(code) if !code.trim().is_empty() => validate_currency_code(code)?,
            _ => String::from(DEFAULT_CURRENCY),
        };

        Ok(CanonicalProduct {
            id: id.to_owned(),
            title: title.to_owned(),
            price: self.price,
            currency,
            rating: self.rating,
            review_count: self.review_count,
            image_url: self.image_url.trim().to_owned(),
            product_url: self.product_url.trim().to_owned(),
            source: self.source,
        })
    }
}

impl TryFrom<ProductDraft> for CanonicalProduct {
    type Error = ValidationError;

    fn try_from(value: ProductDraft) -> Result<Self, Self::Error> {
        value.build()
    }
}

/// Validate and normalize currency to an uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
