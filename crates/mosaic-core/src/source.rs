use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical marketplace identifiers.
///
/// Declaration order is the order in which the combiner collects and
/// concatenates per-provider results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Furniture and decor marketplace.
    Furnishings,
    /// Handmade goods marketplace.
    Handmade,
    /// Home goods marketplace.
    HomeGoods,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Furnishings, Self::Handmade, Self::HomeGoods];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Furnishings => "furnishings",
            Self::Handmade => "handmade",
            Self::HomeGoods => "home_goods",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "furnishings" => Ok(Self::Furnishings),
            "handmade" => Ok(Self::Handmade),
            "home_goods" | "homegoods" => Ok(Self::HomeGoods),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
