//! Newtype IDs for type-safe remote object references.
//!
//! The ad platform hands out opaque string identifiers for every object it
//! creates. Use the `define_id!` macro to wrap them so a campaign ID can never
//! be passed where an ad set ID is expected.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>` and `From<String>`/`From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use campaign_launcher_core::define_id;
/// define_id!(CampaignId);
/// define_id!(AdSetId);
///
/// let campaign = CampaignId::new("120210000000001");
/// let ad_set = AdSetId::new("120210000000002");
///
/// // These are different types, so this won't compile:
/// // let _: CampaignId = ad_set;
/// assert_eq!(campaign.as_str(), "120210000000001");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id!(CampaignId);
define_id!(AdSetId);
define_id!(CreativeId);
define_id!(AdId);
define_id!(VideoId);
define_id!(PixelId);
define_id!(PageId);
define_id!(ImageHash);

/// Prefix the platform puts in front of numeric ad account IDs.
const ACCOUNT_PREFIX: &str = "act_";

/// Errors that can occur when parsing an [`AdAccountId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdAccountIdError {
    /// The input string is empty.
    #[error("ad account ID cannot be empty")]
    Empty,
    /// The numeric part contains something other than ASCII digits.
    #[error("ad account ID must be numeric (optionally prefixed with act_), got {0:?}")]
    NotNumeric(String),
}

/// Advertiser account identifier.
///
/// Always stored in the `act_<digits>` form the platform expects in URL
/// paths. [`AdAccountId::parse`] accepts either the bare number or the
/// prefixed form.
///
/// ```
/// use campaign_launcher_core::AdAccountId;
///
/// assert_eq!(AdAccountId::parse("12345").unwrap().as_str(), "act_12345");
/// assert_eq!(AdAccountId::parse("act_12345").unwrap().as_str(), "act_12345");
/// assert!(AdAccountId::parse("act_").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdAccountId(String);

impl AdAccountId {
    /// Parse an account ID, normalizing to the `act_` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or the numeric part is not
    /// made of ASCII digits.
    pub fn parse(s: &str) -> Result<Self, AdAccountIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AdAccountIdError::Empty);
        }

        let digits = trimmed.strip_prefix(ACCOUNT_PREFIX).unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AdAccountIdError::NotNumeric(trimmed.to_string()));
        }

        Ok(Self(format!("{ACCOUNT_PREFIX}{digits}")))
    }

    /// The `act_`-prefixed identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare numeric identifier.
    #[must_use]
    pub fn numeric(&self) -> &str {
        self.0.strip_prefix(ACCOUNT_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for AdAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AdAccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AdAccountId {
    type Error = AdAccountIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AdAccountId> for String {
    fn from(id: AdAccountId) -> Self {
        id.0
    }
}

impl core::str::FromStr for AdAccountId {
    type Err = AdAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
