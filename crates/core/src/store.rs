//! Store registry: per-brand advertising identifiers.
//!
//! Every brand sells into one country and tracks conversions with its own
//! pixel and publishes from its own page. The registry is built once at
//! startup and only read afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CountryCode, CurrencyCode, PageId, PixelId};

/// Brand/store key, normalized to uppercase (e.g. `TABO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StoreKey(String);

impl StoreKey {
    /// Create a store key; surrounding whitespace is trimmed and the key is
    /// uppercased.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_uppercase())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StoreKey {
    fn from(key: String) -> Self {
        Self::new(&key)
    }
}

impl From<&str> for StoreKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<StoreKey> for String {
    fn from(key: StoreKey) -> Self {
        key.0
    }
}

/// Advertising identifiers for one brand in one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub key: StoreKey,
    /// Tracking pixel the ad sets optimize purchases against.
    pub pixel_id: PixelId,
    /// Page the ads are published from.
    pub page_id: PageId,
    pub currency: CurrencyCode,
    /// Human-readable country name, used in object names.
    pub country_name: String,
    pub country_code: CountryCode,
}

/// Errors raised by registry construction and lookup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreRegistryError {
    /// No profile exists for the key.
    #[error("unknown store: {0}")]
    UnknownStore(StoreKey),
    /// Two profiles share a key.
    #[error("duplicate store: {0}")]
    DuplicateStore(StoreKey),
    /// The registry has no profiles at all.
    #[error("store registry is empty")]
    Empty,
}

/// Read-only lookup table from [`StoreKey`] to [`StoreProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRegistry {
    stores: BTreeMap<StoreKey, StoreProfile>,
}

impl StoreRegistry {
    /// Build a registry from a list of profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or two profiles share a key.
    pub fn from_profiles(
        profiles: impl IntoIterator<Item = StoreProfile>,
    ) -> Result<Self, StoreRegistryError> {
        let mut stores = BTreeMap::new();
        for profile in profiles {
            let key = profile.key.clone();
            if stores.insert(key.clone(), profile).is_some() {
                return Err(StoreRegistryError::DuplicateStore(key));
            }
        }

        if stores.is_empty() {
            return Err(StoreRegistryError::Empty);
        }

        Ok(Self { stores })
    }

    /// The stores shipped with the launcher.
    #[must_use]
    pub fn builtin() -> Self {
        let stores = BUILTIN_STORES
            .iter()
            .map(|s| {
                let profile = StoreProfile {
                    key: StoreKey::new(s.key),
                    pixel_id: PixelId::new(s.pixel_id),
                    page_id: PageId::new(s.page_id),
                    currency: CurrencyCode::from_static(s.currency),
                    country_name: s.country_name.to_string(),
                    country_code: CountryCode::from_static(s.country_code),
                };
                (profile.key.clone(), profile)
            })
            .collect();

        Self { stores }
    }

    /// Look up a store profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreRegistryError::UnknownStore`] if no profile has this key.
    pub fn get(&self, key: &StoreKey) -> Result<&StoreProfile, StoreRegistryError> {
        self.stores
            .get(key)
            .ok_or_else(|| StoreRegistryError::UnknownStore(key.clone()))
    }

    /// Whether a profile exists for the key.
    #[must_use]
    pub fn contains(&self, key: &StoreKey) -> bool {
        self.stores.contains_key(key)
    }

    /// Iterate over all profiles in key order.
    pub fn iter(&self) -> impl Iterator<Item = &StoreProfile> {
        self.stores.values()
    }

    /// Number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether the registry has no stores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

struct BuiltinStore {
    key: &'static str,
    pixel_id: &'static str,
    page_id: &'static str,
    currency: &'static str,
    country_name: &'static str,
    country_code: &'static str,
}

const BUILTIN_STORES: &[BuiltinStore] = &[
    BuiltinStore {
        key: "TABO",
        pixel_id: "4560468307512217",
        page_id: "243219548872531",
        currency: "COP",
        country_name: "COLOMBIA",
        country_code: "CO",
    },
    BuiltinStore {
        key: "LUCENT",
        pixel_id: "563993102229371",
        page_id: "113244918233996",
        currency: "COP",
        country_name: "COLOMBIA",
        country_code: "CO",
    },
    BuiltinStore {
        key: "ESSENTIALS",
        pixel_id: "464847386087738",
        page_id: "102680836073183",
        currency: "COP",
        country_name: "COLOMBIA",
        country_code: "CO",
    },
    BuiltinStore {
        key: "ECUADOR",
        pixel_id: "118188614559337",
        page_id: "105888269081575",
        currency: "USD",
        country_name: "ECUADOR",
        country_code: "EC",
    },
    BuiltinStore {
        key: "GUATEMALA",
        pixel_id: "1388416526052294",
        page_id: "837350399464084",
        currency: "GTQ",
        country_name: "GUATEMALA",
        country_code: "GT",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_codes_are_valid() {
        let registry = StoreRegistry::builtin();
        assert_eq!(registry.len(), 5);
        for profile in registry.iter() {
            assert_eq!(
                CountryCode::parse(profile.country_code.as_str()).as_ref(),
                Ok(&profile.country_code)
            );
            assert_eq!(
                CurrencyCode::parse(profile.currency.as_str()).as_ref(),
                Ok(&profile.currency)
            );
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive_on_key() {
        let registry = StoreRegistry::builtin();
        let profile = registry.get(&StoreKey::new("tabo")).expect("TABO exists");
        assert_eq!(profile.country_code.as_str(), "CO");
        assert_eq!(profile.pixel_id.as_str(), "4560468307512217");
    }

    #[test]
    fn test_unknown_store() {
        let registry = StoreRegistry::builtin();
        let err = registry.get(&StoreKey::new("PERU")).expect_err("unknown");
        assert_eq!(err.to_string(), "unknown store: PERU");
    }

    #[test]
    fn test_from_profiles_rejects_duplicates() {
        let profile = StoreRegistry::builtin()
            .get(&StoreKey::new("ECUADOR"))
            .expect("exists")
            .clone();
        let err = StoreRegistry::from_profiles([profile.clone(), profile])
            .expect_err("duplicate");
        assert_eq!(err, StoreRegistryError::DuplicateStore(StoreKey::new("ECUADOR")));
    }

    #[test]
    fn test_from_profiles_rejects_empty() {
        assert_eq!(
            StoreRegistry::from_profiles(Vec::new()),
            Err(StoreRegistryError::Empty)
        );
    }

    #[test]
    fn test_profile_deserializes() {
        let json = r#"{
            "key": "peru",
            "pixel_id": "111",
            "page_id": "222",
            "currency": "pen",
            "country_name": "PERU",
            "country_code": "pe"
        }"#;
        let profile: StoreProfile = serde_json::from_str(json).expect("deserialize");
        assert_eq!(profile.key.as_str(), "PERU");
        assert_eq!(profile.currency.as_str(), "PEN");
        assert_eq!(profile.country_code.as_str(), "PE");
    }
}
