//! Geographic tagging used by the Selector's region preference and the
//! Dispatcher's client/target geo resolution.

use serde::{Deserialize, Serialize};

/// A resolved (or fallback) geographic tag for a client or a destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GeoTag {
    /// ISO-3166-1 alpha-2 country code, upper-cased. `"XX"` means unknown.
    pub country: String,
    /// Optional finer-grained region/city label.
    pub region: Option<String>,
}

impl GeoTag {
    #[must_use]
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into().to_uppercase(),
            region: None,
        }
    }

    #[must_use]
    pub fn with_region(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into().to_uppercase(),
            region: Some(region.into()),
        }
    }

    /// Unknown-geography sentinel used when no lookup or fallback matched.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("XX")
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.country == "XX"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_recognized() {
        assert!(GeoTag::unknown().is_unknown());
        assert!(!GeoTag::new("cn").is_unknown());
    }

    #[test]
    fn country_is_normalized_upper_case() {
        assert_eq!(GeoTag::new("cn").country, "CN");
    }
}
